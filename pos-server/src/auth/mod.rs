//! 认证授权模块
//!
//! - [`JwtService`] - 令牌校验
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] / [`require_permission`] - 中间件

pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{authenticate, require_auth, require_permission};
