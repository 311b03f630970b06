use tabula_core::{CompilationContext, Result};

use std::fmt::Debug;

/// Request validation that runs before any compiler.
///
/// Implementations return [`Error::security_violation`] to reject the
/// request; the compiler is then never invoked.
///
/// [`Error::security_violation`]: tabula_core::Error::security_violation
pub trait RequestGuard: Debug + Send + Sync {
    fn check(&self, ctx: &CompilationContext) -> Result<()>;
}

/// Accepts every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl RequestGuard for AllowAll {
    fn check(&self, _ctx: &CompilationContext) -> Result<()> {
        Ok(())
    }
}
