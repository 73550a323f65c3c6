//! Variable discovery over the AST.
//!
//! Two walks live here: [`LoweringContext::harvest`] records every variable
//! and blank node label written anywhere in the request, and
//! [`in_scope_variables`] computes the variables bound by a graph pattern,
//! which `SELECT *` projects.

use super::LoweringContext;
use crate::ast::{
    BlankNodeValue, DescribeTarget, Expression, GraphNode, GraphPattern, GroupCondition,
    OrderExpr, QueryBody, Quads, SelectQuery, SelectVariable, SelectVariables,
    SolutionModifiers, SparqlAst, Term, TriplePattern, UpdateOperation, Var, VarOrIri, Verb,
};
use crate::term::TermFactory;
use std::collections::BTreeSet;
use std::sync::Arc;

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    /// Record every variable name and blank node label in `ast`.
    pub(crate) fn harvest(&mut self, ast: &SparqlAst) {
        let mut names = Names::default();
        names.body(&ast.body);
        self.variables.extend(names.variables);
        self.blank_labels.extend(names.blanks);
    }
}

#[derive(Default)]
struct Names {
    variables: Vec<Arc<str>>,
    blanks: Vec<Arc<str>>,
}

impl Names {
    fn var(&mut self, var: &Var) {
        self.variables.push(var.name.clone());
    }

    fn var_or_iri(&mut self, v: &VarOrIri) {
        if let VarOrIri::Var(var) = v {
            self.var(var);
        }
    }

    fn term(&mut self, term: &Term) {
        match term {
            Term::Var(v) => self.var(v),
            Term::BlankNode(b) => {
                if let BlankNodeValue::Labeled(label) = &b.value {
                    self.blanks.push(label.clone());
                }
            }
            Term::QuotedTriple(q) => {
                self.term(&q.subject);
                self.var_or_iri(&q.predicate);
                self.term(&q.object);
            }
            Term::Iri(_) | Term::Literal(_) => {}
        }
    }

    fn node(&mut self, node: &GraphNode) {
        match node {
            GraphNode::Term(t) => self.term(t),
            GraphNode::Collection { items, .. } => items.iter().for_each(|i| self.node(i)),
            GraphNode::BlankNodePropertyList { properties, .. } => {
                for entry in properties {
                    self.verb(&entry.verb);
                    self.node(&entry.object);
                }
            }
        }
    }

    fn verb(&mut self, verb: &Verb) {
        if let Verb::Simple(v) = verb {
            self.var_or_iri(v);
        }
    }

    fn triple(&mut self, triple: &TriplePattern) {
        self.node(&triple.subject);
        self.verb(&triple.predicate);
        self.node(&triple.object);
    }

    fn pattern(&mut self, pattern: &GraphPattern) {
        match pattern {
            GraphPattern::Bgp { patterns, .. } => patterns.iter().for_each(|t| self.triple(t)),
            GraphPattern::Group { patterns, .. } => patterns.iter().for_each(|p| self.pattern(p)),
            GraphPattern::Optional { pattern, .. } | GraphPattern::Minus { pattern, .. } => {
                self.pattern(pattern)
            }
            GraphPattern::Union { left, right, .. } => {
                self.pattern(left);
                self.pattern(right);
            }
            GraphPattern::Filter { expr, .. } => self.expression(expr),
            GraphPattern::Bind { expr, var, .. } => {
                self.expression(expr);
                self.var(var);
            }
            GraphPattern::Values { vars, data, .. } => {
                vars.iter().for_each(|v| self.var(v));
                data.iter().flatten().flatten().for_each(|t| self.term(t));
            }
            GraphPattern::Graph { name, pattern, .. } => {
                self.var_or_iri(name);
                self.pattern(pattern);
            }
            GraphPattern::Service {
                endpoint, pattern, ..
            } => {
                self.var_or_iri(endpoint);
                self.pattern(pattern);
            }
            GraphPattern::SubSelect { query, .. } => self.select(query),
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Var(v) => self.var(v),
            Expression::Literal(_) | Expression::Iri(_) => {}
            Expression::Binary { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            Expression::Unary { operand, .. } => self.expression(operand),
            Expression::FunctionCall { args, .. } | Expression::Coalesce { args, .. } => {
                args.iter().for_each(|a| self.expression(a))
            }
            Expression::If {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                self.expression(condition);
                self.expression(then_expr);
                self.expression(else_expr);
            }
            Expression::In { expr, list, .. } => {
                self.expression(expr);
                list.iter().for_each(|a| self.expression(a));
            }
            Expression::Exists { pattern, .. } | Expression::NotExists { pattern, .. } => {
                self.pattern(pattern)
            }
            Expression::Aggregate { expr, .. } => {
                if let Some(e) = expr {
                    self.expression(e);
                }
            }
            Expression::Bracketed { inner, .. } => self.expression(inner),
        }
    }

    fn modifiers(&mut self, modifiers: &SolutionModifiers) {
        if let Some(group_by) = &modifiers.group_by {
            for condition in &group_by.conditions {
                match condition {
                    GroupCondition::Var(v) => self.var(v),
                    GroupCondition::Expr { expr, alias, .. } => {
                        self.expression(expr);
                        if let Some(alias) = alias {
                            self.var(alias);
                        }
                    }
                }
            }
        }
        if let Some(having) = &modifiers.having {
            having.conditions.iter().for_each(|e| self.expression(e));
        }
        if let Some(order_by) = &modifiers.order_by {
            for condition in &order_by.conditions {
                match &condition.expr {
                    OrderExpr::Var(v) => self.var(v),
                    OrderExpr::Expr(e) => self.expression(e),
                }
            }
        }
        if let Some(values) = &modifiers.values {
            values.vars.iter().for_each(|v| self.var(v));
            values.data.iter().flatten().flatten().for_each(|t| self.term(t));
        }
    }

    fn select(&mut self, query: &SelectQuery) {
        if let SelectVariables::Explicit(vars) = &query.select.variables {
            for var in vars {
                match var {
                    SelectVariable::Var(v) => self.var(v),
                    SelectVariable::Expr { expr, alias, .. } => {
                        self.expression(expr);
                        self.var(alias);
                    }
                }
            }
        }
        self.pattern(&query.where_clause.pattern);
        self.modifiers(&query.modifiers);
    }

    fn quads(&mut self, quads: &[Quads]) {
        for block in quads {
            if let Some(graph) = &block.graph {
                self.var_or_iri(graph);
            }
            block.triples.iter().for_each(|t| self.triple(t));
        }
    }

    fn body(&mut self, body: &QueryBody) {
        match body {
            QueryBody::Select(q) => self.select(q),
            QueryBody::Construct(q) => {
                if let Some(template) = &q.template {
                    template.triples.iter().for_each(|t| self.triple(t));
                }
                self.pattern(&q.where_clause.pattern);
                self.modifiers(&q.modifiers);
            }
            QueryBody::Ask(q) => {
                self.pattern(&q.where_clause.pattern);
                self.modifiers(&q.modifiers);
            }
            QueryBody::Describe(q) => {
                if let DescribeTarget::Resources(targets) = &q.target {
                    targets.iter().for_each(|t| self.var_or_iri(t));
                }
                if let Some(where_clause) = &q.where_clause {
                    self.pattern(&where_clause.pattern);
                }
                self.modifiers(&q.modifiers);
            }
            QueryBody::Update(request) => {
                for unit in &request.operations {
                    match &unit.operation {
                        UpdateOperation::InsertData(op) => self.quads(&op.data.quads),
                        UpdateOperation::DeleteData(op) => self.quads(&op.data.quads),
                        UpdateOperation::DeleteWhere(op) => self.quads(&op.pattern.quads),
                        UpdateOperation::Modify(op) => {
                            if let Some(delete) = &op.delete_clause {
                                self.quads(&delete.quads);
                            }
                            if let Some(insert) = &op.insert_clause {
                                self.quads(&insert.quads);
                            }
                            self.pattern(&op.where_clause.pattern);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Variables in scope for `pattern`, sorted by name.
pub(crate) fn in_scope_variables(pattern: &GraphPattern) -> Vec<Arc<str>> {
    let mut vars = BTreeSet::new();
    pattern_scope(pattern, &mut vars);
    vars.into_iter().collect()
}

fn pattern_scope(pattern: &GraphPattern, vars: &mut BTreeSet<Arc<str>>) {
    match pattern {
        GraphPattern::Bgp { patterns, .. } => {
            for triple in patterns {
                node_scope(&triple.subject, vars);
                verb_scope(&triple.predicate, vars);
                node_scope(&triple.object, vars);
            }
        }
        GraphPattern::Group { patterns, .. } => {
            patterns.iter().for_each(|p| pattern_scope(p, vars))
        }
        GraphPattern::Optional { pattern, .. } => pattern_scope(pattern, vars),
        // MINUS binds nothing
        GraphPattern::Minus { .. } | GraphPattern::Filter { .. } => {}
        GraphPattern::Union { left, right, .. } => {
            pattern_scope(left, vars);
            pattern_scope(right, vars);
        }
        GraphPattern::Bind { var, .. } => {
            vars.insert(var.name.clone());
        }
        GraphPattern::Values { vars: columns, .. } => {
            vars.extend(columns.iter().map(|v| v.name.clone()))
        }
        GraphPattern::Graph { name, pattern, .. }
        | GraphPattern::Service {
            endpoint: name,
            pattern,
            ..
        } => {
            if let VarOrIri::Var(v) = name {
                vars.insert(v.name.clone());
            }
            pattern_scope(pattern, vars);
        }
        GraphPattern::SubSelect { query, .. } => match &query.select.variables {
            SelectVariables::Star => pattern_scope(&query.where_clause.pattern, vars),
            SelectVariables::Explicit(selected) => {
                vars.extend(selected.iter().map(|s| s.var().name.clone()))
            }
        },
    }
}

fn term_scope(term: &Term, vars: &mut BTreeSet<Arc<str>>) {
    match term {
        Term::Var(v) => {
            vars.insert(v.name.clone());
        }
        Term::QuotedTriple(q) => {
            term_scope(&q.subject, vars);
            if let VarOrIri::Var(v) = &q.predicate {
                vars.insert(v.name.clone());
            }
            term_scope(&q.object, vars);
        }
        Term::Iri(_) | Term::Literal(_) | Term::BlankNode(_) => {}
    }
}

fn node_scope(node: &GraphNode, vars: &mut BTreeSet<Arc<str>>) {
    match node {
        GraphNode::Term(t) => term_scope(t, vars),
        GraphNode::Collection { items, .. } => items.iter().for_each(|i| node_scope(i, vars)),
        GraphNode::BlankNodePropertyList { properties, .. } => {
            for entry in properties {
                verb_scope(&entry.verb, vars);
                node_scope(&entry.object, vars);
            }
        }
    }
}

fn verb_scope(verb: &Verb, vars: &mut BTreeSet<Arc<str>>) {
    match verb {
        Verb::Simple(VarOrIri::Var(v)) => {
            vars.insert(v.name.clone());
        }
        // Paths have no variables inside
        Verb::Simple(VarOrIri::Iri(_)) | Verb::Path(_) => {}
    }
}
