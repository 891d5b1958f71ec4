//! Deferred method lowering
//!
//! A deferred body keeps its `MethodJob` until first use. The job carries a
//! snapshot of the parse environment taken at the definition site, so the
//! unit it produces is the one eager lowering would have produced.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::method::MethodJob;
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::{DefinitionId, ExecutableUnit};
use crate::parser::{LexicalScope, ParseEnvironment};

/// Parse environment state a method body depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazySnapshot {
    pub lexical_scope: Arc<LexicalScope>,
    pub dynamic_constant_lookup: bool,
}

impl LazySnapshot {
    pub fn capture(env: &ParseEnvironment) -> Self {
        Self {
            lexical_scope: Arc::clone(env.lexical_scope()),
            dynamic_constant_lookup: env.is_dynamic_constant_lookup(),
        }
    }

    pub fn restore(&self, env: &mut ParseEnvironment) {
        env.reset_lexical_scope(Arc::clone(&self.lexical_scope));
        env.set_dynamic_constant_lookup(self.dynamic_constant_lookup);
    }
}

/// A method body lowered on first use.
///
/// Concurrent first calls block on a single lowering and all observe the
/// same unit, or the same error.
pub struct DeferredUnit {
    definition: DefinitionId,
    cell: OnceCell<LowerResult<Arc<ExecutableUnit>>>,
    /// Taken exactly once, by the lowering that fills `cell`
    pending: Mutex<Option<MethodJob>>,
}

impl DeferredUnit {
    pub fn new(job: MethodJob) -> Self {
        Self {
            definition: job.definition_id().clone(),
            cell: OnceCell::new(),
            pending: Mutex::new(Some(job)),
        }
    }

    pub fn definition_id(&self) -> &DefinitionId {
        &self.definition
    }

    /// Whether the body has been lowered
    pub fn is_forced(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Lower the body if needed and return the unit
    pub fn force(&self) -> LowerResult<Arc<ExecutableUnit>> {
        self.cell
            .get_or_init(|| {
                let job = self.pending.lock().take();
                match job {
                    Some(job) => {
                        log::debug!("[Lowering] forcing deferred method {}", self.definition);
                        job.run()
                    }
                    None => Err(LowerError::Internal {
                        message: format!("deferred method {} lost its job", self.definition),
                    }),
                }
            })
            .clone()
    }
}

impl fmt::Debug for DeferredUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredUnit")
            .field("definition", &self.definition)
            .field("forced", &self.is_forced())
            .finish()
    }
}
