//! # Stratalog
//!
//! A deductive-database compiler/runtime. The core of this crate is two
//! pieces:
//!
//! - the control-flow IR (`cfg`): lowers a `datalog_ir::Query` DAG of views
//!   into a tree of regions, runs a three-phase induction engine over
//!   cyclic unions, synthesizes top-down checkers for negated views, and
//!   simplifies the tree to a fixed point (SPEC_FULL §3-§4.5).
//! - the slab storage runtime (`storage::slab`): a custom 2 MiB-slab
//!   allocator with content-addressed serialization and typed references
//!   into discontiguous byte storage, backing the tables, indices, and
//!   vectors the control-flow IR names (SPEC_FULL §4.6-§4.8).
//!
//! Everything else in this crate — the surface parser (`parser`,
//! `statement`), relation schemas (`schema`), the value type system
//! (`value`), the interactive syntax highlighter (`syntax`), and execution
//! hardening (`execution`) — sits in front of or alongside the core as a
//! named, ambient interface; the query optimizer, code generator, and
//! network façade that would normally consume `cfg::Program` are out of
//! scope here and are not implemented.
//!
//! ## Usage
//!
//! ```rust
//! use datalog_ir::QueryBuilder;
//! use stratalog::cfg;
//!
//! let mut builder = QueryBuilder::new();
//! // ... register views on `builder` ...
//! let query = builder.finish();
//! let program = cfg::compile(&query);
//! ```
//!
//! ## Module Organization
//!
//! | Module | Role |
//! |--------|------|
//! | `cfg` | Control-flow IR: region tree, builder, induction engine, checkers, optimizer |
//! | `storage` | Slab-based persistent storage runtime |
//! | `config` | Hierarchical configuration (`figment`) |
//! | `value` | Value/Tuple/TupleSchema type system |
//! | `schema` | Relation schema declarations and validation |
//! | `statement` | Datalog statement parsing (facts, rules, meta-commands) |
//! | `parser` | Surface-syntax parser producing `ast::Program` |
//! | `ast` | Parsed-module AST types |
//! | `syntax` | Interactive syntax highlighting |
//! | `execution` | Query timeout, resource limits, result caching |

pub mod ast;

/// Control-flow IR: region tree, builder, induction engine, checkers,
/// optimizer (SPEC_FULL §3-§4.5).
pub mod cfg;

pub use crate::ast::{
    Atom, BodyPredicate, ComparisonOp, Program, Rule, Term,
    AggregateFunc, BuiltinFunc, ArithExpr, ArithOp,
};

pub mod parser;
pub mod statement;

pub mod config;
pub mod storage;

pub mod execution;

pub mod value;
pub use value::{DataType, Value, Tuple, TupleSchema, SchemaValidationError};

pub mod schema;
pub use schema::{
    RelationSchema, ColumnSchema, SchemaType, ColumnAnnotation,
    ValidationConfig, CheckConstraint, ValidationTiming, FailureAction,
    SchemaCatalog, ValidationEngine, ValidationError, Violation,
    TypeAlias,
};

pub mod syntax;

pub use config::Config;

pub use execution::{
    ExecutionConfig,
    QueryTimeout, TimeoutError, CancelHandle,
    ResourceLimits, ResourceError, MemoryTracker,
    QueryCache, CacheEntry, CacheStats,
};

pub use statement::{
    Statement, MetaCommand, InsertOp, DeleteOp, DeletePattern, UpdateOp,
    ViewDef, QueryGoal, DeleteTarget, InsertTarget,
    SerializableRule, SerializableTerm, SerializableBodyPred, SerializableConstraint,
    parse_statement, parse_view_definition,
};

pub use parser::{parse_program, parse_rule};
