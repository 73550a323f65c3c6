//! Generic iterative tree rewriter.
//!
//! Every pass over the algebra (aggregate replacement, blank-node renaming,
//! quad embedding and removal, canonicalization, scope computation) is built
//! on the two entry points here:
//!
//! - [`TreeRewriter::transform`] - copy-transform, children before parents
//! - [`TreeRewriter::visit`] - read-only post-order traversal
//!
//! Both run on an explicit work stack instead of the call stack. A tree that
//! needs more than `max_stack_size` pending entries fails with
//! [`RewriteError::StackOverflow`] instead of crashing the process.
//!
//! Operation metadata is never traversed. It moves with its owning node as a
//! plain value, and its [`NodeRef`](crate::algebra::NodeRef) links are
//! positional, so self-referencing or ancestor-referencing metadata copies
//! through a transform unchanged.
//!
//! ## Per-node decisions
//!
//! A pre-visit callback returns a [`TransformContext`] for each node:
//!
//! - `descend` (default `true`): transform the children before the node
//! - `shortcut` (default `false`): do not descend, transform this node, and
//!   pass every node not yet visited through unchanged. Ancestors still
//!   reassemble and transform.
//! - `copy` (default `true`): when `false`, the node is reassembled from its
//!   transformed children but not handed to the transform callback

use crate::algebra::{Node, NodeKind, NodeView, Operation};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Default bound on the work stack.
pub const DEFAULT_MAX_STACK_SIZE: usize = 1_000_000;

/// Rewriter failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// Work stack exceeded the configured bound
    #[error("Transform object stack overflowed (limit {limit})")]
    StackOverflow { limit: usize },

    /// A transform returned a child of the wrong node family for its slot
    #[error("Transformed children do not fit a {parent:?} node")]
    ChildMismatch { parent: NodeKind },

    /// The root was transformed into a node of a different family
    #[error("Expected the transformed root to be an operation, got {found:?}")]
    RootMismatch { found: NodeKind },
}

/// Per-node traversal decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformContext {
    pub descend: bool,
    pub shortcut: bool,
    pub copy: bool,
}

impl Default for TransformContext {
    fn default() -> Self {
        Self {
            descend: true,
            shortcut: false,
            copy: true,
        }
    }
}

impl TransformContext {
    /// Transform the node without descending into it.
    pub fn skip() -> Self {
        Self {
            descend: false,
            ..Self::default()
        }
    }

    /// Transform the node, then stop visiting anything else.
    pub fn shortcut() -> Self {
        Self {
            descend: false,
            shortcut: true,
            copy: true,
        }
    }

    /// Descend, but leave the node itself untransformed.
    pub fn keep() -> Self {
        Self {
            copy: false,
            ..Self::default()
        }
    }
}

enum Task {
    Visit(Node),
    Build {
        node: Node,
        children: usize,
        apply: bool,
    },
}

enum ViewTask<'a> {
    Enter(NodeView<'a>),
    Exit(NodeView<'a>),
}

/// The traversal engine.
#[derive(Clone, Copy, Debug)]
pub struct TreeRewriter {
    max_stack_size: usize,
}

impl Default for TreeRewriter {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }
}

impl TreeRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_stack_size(max_stack_size: usize) -> Self {
        Self { max_stack_size }
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    fn check_stack(&self, len: usize) -> Result<(), RewriteError> {
        if len > self.max_stack_size {
            tracing::warn!(limit = self.max_stack_size, "rewrite stack limit exceeded");
            return Err(RewriteError::StackOverflow {
                limit: self.max_stack_size,
            });
        }
        Ok(())
    }

    /// Copy-transform `root`.
    ///
    /// `pre` is consulted once per visited node, before its children.
    /// `map` receives each node after its children have been transformed and
    /// returns the replacement.
    pub fn transform<E, P, M>(&self, root: Node, mut pre: P, mut map: M) -> Result<Node, E>
    where
        E: From<RewriteError>,
        P: FnMut(NodeView<'_>) -> TransformContext,
        M: FnMut(Node) -> Result<Node, E>,
    {
        let mut tasks = vec![Task::Visit(root)];
        let mut done: Vec<Node> = Vec::new();
        let mut stopped = false;

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(node) if stopped => done.push(node),
                Task::Visit(mut node) => {
                    let ctx = pre(node.view());
                    if ctx.shortcut {
                        stopped = true;
                    }
                    if ctx.descend && !ctx.shortcut {
                        let children = node.take_children();
                        let count = children.len();
                        tasks.push(Task::Build {
                            node,
                            children: count,
                            apply: ctx.copy,
                        });
                        tasks.extend(children.into_iter().rev().map(Task::Visit));
                        self.check_stack(tasks.len() + done.len())?;
                    } else if ctx.copy {
                        done.push(map(node)?);
                    } else {
                        done.push(node);
                    }
                }
                Task::Build {
                    mut node,
                    children,
                    apply,
                } => {
                    let parent = node.kind();
                    let start = done
                        .len()
                        .checked_sub(children)
                        .ok_or(RewriteError::ChildMismatch { parent })?;
                    let transformed = done.split_off(start);
                    node.put_children(transformed)
                        .map_err(|_| RewriteError::ChildMismatch { parent })?;
                    done.push(if apply { map(node)? } else { node });
                }
            }
        }

        match done.pop() {
            Some(root) if done.is_empty() => Ok(root),
            other => {
                let parent = other.as_ref().map(Node::kind).unwrap_or(NodeKind::Nop);
                Err(RewriteError::ChildMismatch { parent }.into())
            }
        }
    }

    /// [`transform`](Self::transform) for an operation root.
    pub fn transform_operation<E, P, M>(&self, root: Operation, pre: P, map: M) -> Result<Operation, E>
    where
        E: From<RewriteError>,
        P: FnMut(NodeView<'_>) -> TransformContext,
        M: FnMut(Node) -> Result<Node, E>,
    {
        match self.transform(Node::Operation(root), pre, map)? {
            Node::Operation(op) => Ok(op),
            other => Err(RewriteError::RootMismatch { found: other.kind() }.into()),
        }
    }

    /// Read-only post-order traversal.
    ///
    /// `visitor` sees every node after its children. `pre` controls descent
    /// and shortcutting as for [`transform`](Self::transform); `copy` has no
    /// effect here.
    pub fn visit<'a, P, V>(
        &self,
        root: NodeView<'a>,
        mut pre: P,
        mut visitor: V,
    ) -> Result<(), RewriteError>
    where
        P: FnMut(NodeView<'a>) -> TransformContext,
        V: FnMut(NodeView<'a>),
    {
        let mut tasks = vec![ViewTask::Enter(root)];
        let mut stopped = false;

        while let Some(task) = tasks.pop() {
            match task {
                ViewTask::Enter(_) if stopped => {}
                ViewTask::Enter(node) => {
                    let ctx = pre(node);
                    if ctx.shortcut {
                        stopped = true;
                    }
                    tasks.push(ViewTask::Exit(node));
                    if ctx.descend && !ctx.shortcut {
                        tasks.extend(node.children().into_iter().rev().map(ViewTask::Enter));
                        self.check_stack(tasks.len())?;
                    }
                }
                ViewTask::Exit(node) => visitor(node),
            }
        }
        Ok(())
    }
}

type TransformFn<'f, E> = Box<dyn FnMut(Node) -> Result<Node, E> + 'f>;
type PrevisitFn<'f> = Box<dyn FnMut(NodeView<'_>) -> TransformContext + 'f>;

/// Table-driven rewriter: transforms and pre-visit hooks keyed by node kind.
///
/// Nodes without a registered transform are reassembled unchanged; nodes
/// without a pre-visit hook use [`TransformContext::default`].
pub struct Rewriter<'f, E> {
    engine: TreeRewriter,
    transforms: FxHashMap<NodeKind, TransformFn<'f, E>>,
    previsits: FxHashMap<NodeKind, PrevisitFn<'f>>,
}

impl<'f, E: From<RewriteError>> Default for Rewriter<'f, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, E: From<RewriteError>> Rewriter<'f, E> {
    pub fn new() -> Self {
        Self {
            engine: TreeRewriter::default(),
            transforms: FxHashMap::default(),
            previsits: FxHashMap::default(),
        }
    }

    pub fn with_engine(mut self, engine: TreeRewriter) -> Self {
        self.engine = engine;
        self
    }

    /// Register the transform for one node kind.
    pub fn on<F>(mut self, kind: NodeKind, transform: F) -> Self
    where
        F: FnMut(Node) -> Result<Node, E> + 'f,
    {
        self.transforms.insert(kind, Box::new(transform));
        self
    }

    /// Register the pre-visit hook for one node kind.
    pub fn previsit<F>(mut self, kind: NodeKind, hook: F) -> Self
    where
        F: FnMut(NodeView<'_>) -> TransformContext + 'f,
    {
        self.previsits.insert(kind, Box::new(hook));
        self
    }

    pub fn rewrite(&mut self, root: Node) -> Result<Node, E> {
        let Self {
            engine,
            transforms,
            previsits,
        } = self;
        engine.transform(
            root,
            |view| match previsits.get_mut(&view.kind()) {
                Some(hook) => hook(view),
                None => TransformContext::default(),
            },
            |node| match transforms.get_mut(&node.kind()) {
                Some(transform) => transform(node),
                None => Ok(node),
            },
        )
    }

    pub fn rewrite_operation(&mut self, root: Operation) -> Result<Operation, E> {
        match self.rewrite(Node::Operation(root))? {
            Node::Operation(op) => Ok(op),
            other => Err(RewriteError::RootMismatch { found: other.kind() }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Expression, Metadata, NodeRef, Op, Pattern};
    use crate::term::{NamedNode, Term, Variable};

    fn pattern(s: &str) -> Pattern {
        Pattern::new(
            Term::Variable(Variable::new(s)),
            Term::NamedNode(NamedNode::new("http://ex.org/p")),
            Term::Variable(Variable::new("o")),
            Term::DefaultGraph,
        )
    }

    fn noop(root: Operation) -> Result<Operation, RewriteError> {
        TreeRewriter::default().transform_operation(root, |_| TransformContext::default(), Ok)
    }

    #[test]
    fn test_noop_transform_is_identity() {
        let op = Operation::project(
            Operation::filter(
                Operation::join(vec![
                    Operation::bgp(vec![pattern("a")]),
                    Operation::bgp(vec![pattern("b")]),
                ]),
                Expression::operator("bound", vec![Expression::variable("a")]),
            ),
            vec![Variable::new("a")],
        );
        assert_eq!(noop(op.clone()).unwrap(), op);
    }

    #[test]
    fn test_children_transformed_before_parent() {
        let op = Operation::distinct(Operation::bgp(vec![pattern("a")]));
        let mut order = Vec::new();
        TreeRewriter::default()
            .transform_operation::<RewriteError, _, _>(
                op,
                |_| TransformContext::default(),
                |node| {
                    order.push(node.kind());
                    Ok(node)
                },
            )
            .unwrap();
        assert_eq!(
            order,
            vec![NodeKind::Pattern, NodeKind::Bgp, NodeKind::Distinct]
        );
    }

    #[test]
    fn test_self_referencing_metadata_survives() {
        let meta = Metadata::new().with_link("self", NodeRef::this());
        let op = Operation::bgp(vec![pattern("a")]).with_metadata(meta.clone());
        let root = Operation::reduced(op);
        let copied = noop(root).unwrap();
        let Op::Reduced { input } = &copied.node else {
            panic!("expected reduced");
        };
        assert_eq!(input.metadata.as_deref(), Some(&meta));
    }

    #[test]
    fn test_skip_prevents_descent() {
        let op = Operation::distinct(Operation::bgp(vec![pattern("a")]));
        let mut seen = Vec::new();
        TreeRewriter::default()
            .transform_operation::<RewriteError, _, _>(
                op,
                |view| {
                    if view.kind() == NodeKind::Distinct {
                        TransformContext::skip()
                    } else {
                        TransformContext::default()
                    }
                },
                |node| {
                    seen.push(node.kind());
                    Ok(node)
                },
            )
            .unwrap();
        assert_eq!(seen, vec![NodeKind::Distinct]);
    }

    #[test]
    fn test_shortcut_passes_remaining_nodes_through() {
        let op = Operation::join(vec![
            Operation::bgp(vec![pattern("a")]),
            Operation::bgp(vec![pattern("b")]),
        ]);
        let mut seen = Vec::new();
        let result = TreeRewriter::default()
            .transform_operation::<RewriteError, _, _>(
                op.clone(),
                |view| {
                    if view.kind() == NodeKind::Bgp {
                        TransformContext::shortcut()
                    } else {
                        TransformContext::default()
                    }
                },
                |node| {
                    seen.push(node.kind());
                    Ok(node)
                },
            )
            .unwrap();
        assert_eq!(seen, vec![NodeKind::Bgp, NodeKind::Join]);
        assert_eq!(result, op);
    }

    #[test]
    fn test_keep_skips_mapper() {
        let op = Operation::distinct(Operation::nop());
        let result = TreeRewriter::default()
            .transform_operation::<RewriteError, _, _>(
                op.clone(),
                |_| TransformContext::keep(),
                |_| Ok(Node::Operation(Operation::bgp(vec![]))),
            )
            .unwrap();
        assert_eq!(result, op);
    }

    #[test]
    fn test_stack_overflow_is_reported() {
        let mut op = Operation::nop();
        for _ in 0..64 {
            op = Operation::distinct(op);
        }
        let err = TreeRewriter::with_max_stack_size(16)
            .transform_operation::<RewriteError, _, _>(op, |_| TransformContext::default(), Ok)
            .unwrap_err();
        assert_eq!(err, RewriteError::StackOverflow { limit: 16 });
    }

    #[test]
    fn test_child_family_mismatch() {
        let op = Operation::distinct(Operation::nop());
        let err = TreeRewriter::default()
            .transform_operation::<RewriteError, _, _>(
                op,
                |_| TransformContext::default(),
                |node| match node.kind() {
                    NodeKind::Nop => Ok(Node::Pattern(Pattern::default())),
                    _ => Ok(node),
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            RewriteError::ChildMismatch {
                parent: NodeKind::Distinct
            }
        );
    }

    #[test]
    fn test_visit_post_order() {
        let op = Operation::left_join(
            Operation::bgp(vec![]),
            Operation::nop(),
            Some(Expression::variable("x")),
        );
        let mut kinds = Vec::new();
        TreeRewriter::default()
            .visit(
                NodeView::Operation(&op),
                |_| TransformContext::default(),
                |v| kinds.push(v.kind()),
            )
            .unwrap();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Bgp,
                NodeKind::Nop,
                NodeKind::TermExpression,
                NodeKind::LeftJoin
            ]
        );
    }

    #[test]
    fn test_table_rewriter_by_kind() {
        let op = Operation::union(vec![
            Operation::bgp(vec![pattern("a")]),
            Operation::bgp(vec![pattern("b")]),
        ]);
        let mut rewriter: Rewriter<'_, RewriteError> =
            Rewriter::new().on(NodeKind::Pattern, |node| match node {
                Node::Pattern(mut p) => {
                    p.graph = Term::NamedNode(NamedNode::new("http://ex.org/g"));
                    Ok(Node::Pattern(p))
                }
                other => Ok(other),
            });
        let out = rewriter.rewrite_operation(op).unwrap();
        let Op::Union { input } = &out.node else {
            panic!("expected union");
        };
        for child in input {
            let Op::Bgp { patterns } = &child.node else {
                panic!("expected bgp");
            };
            assert_eq!(
                patterns[0].graph,
                Term::NamedNode(NamedNode::new("http://ex.org/g"))
            );
        }
    }
}
