//! Garnet Engine
//!
//! The method and block lowering pass of the Garnet compiler front end:
//! - **Parser interfaces**: the AST node set, source lines and lexical
//!   scopes the pass consumes (`parser` module)
//! - **Compiler**: the lowering pass, argument binding and the executable
//!   units handed to the runtime (`compiler` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use garnet_engine::{ast::*, LowerOptions, Lowerer, Source, SourceRange};
//!
//! let source = Arc::new(Source::new("example.rb", "def f(x)\n  x\nend\n"));
//! let def = MethodDefNode::new(
//!     "f",
//!     ArgsNode::required(["x"]),
//!     Expr::local("x"),
//!     SourceRange::new(0, 1),
//! );
//!
//! let mut lowerer = Lowerer::new(source, LowerOptions::default());
//! let program = lowerer.lower_program(&Expr::method_def(def)).unwrap();
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Parser interfaces: AST, source text and lexical scopes
pub mod parser;

/// Compiler module: lowering pass and executable units
pub mod compiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use parser::{ast, extend_to_closing_line, LexicalScope, ParseEnvironment, Source, SourceRange};

pub use compiler::{
    // Errors
    ConfigError, GuestError, LowerError, LowerResult,
    // Options
    LowerOptions, PrimitiveMarker,
    // Lowering
    should_destructure, Arity, DeferredUnit, LazySnapshot, Lowerer,
    // Binding
    ArgumentBinder, BindHost, BindMode, BoundArguments, LoadArgumentsBinder,
    // Output
    ir, BlockDefinition, CallShape, DefinitionId, ExecutableUnit, MethodBody, MethodDefinition,
    Node, PrettyPrint, ProcType, UnitKind,
};
