// Two tiers:
//   public    - no authentication (/, /health, /auth/signup, /auth/token)
//   protected - bearer JWT required; `jwt_auth_middleware` inserts `AuthUser`
//
// Handlers are thin: open the request's transaction, call the service,
// commit, wrap the result in the success envelope.
pub mod protected;
pub mod public;
