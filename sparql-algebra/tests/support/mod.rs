//! Shared harness for sparql-algebra integration tests.
//!
//! `builders` constructs ASTs without a parser; `span_capture` records the
//! tracing spans a translation opens.

// Each integration test crate uses a different subset of the helpers.
#![allow(dead_code)]

pub mod builders;
pub mod span_capture;

use sparql_algebra::{canonicalize, lift, lower, LowerOptions, Operation, SparqlAst};

/// Lower, lift and lower again; returns both algebra trees canonicalized.
pub fn round_trip(ast: &SparqlAst, options: &LowerOptions) -> (Operation, Operation) {
    let first = lower(ast, options).expect("lower original");
    let lifted = lift(&first).expect("lift");
    let second = lower(&lifted, options).expect("lower lifted");
    (
        canonicalize(&first, true).expect("canonicalize original"),
        canonicalize(&second, true).expect("canonicalize lifted"),
    )
}

/// Assert that `ast` survives lowering, lifting and lowering again.
#[track_caller]
pub fn assert_round_trip(ast: &SparqlAst, options: &LowerOptions) {
    let (first, second) = round_trip(ast, options);
    assert_eq!(first, second, "round trip changed the algebra");
}
