//! Component launch redirection through host stubs.

pub mod interceptor;
pub mod recovery;

pub use interceptor::RedirectInterceptor;
pub use recovery::UpgradeRecovery;
