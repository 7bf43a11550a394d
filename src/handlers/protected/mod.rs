// Protected handlers: every route here sits behind `jwt_auth_middleware`
pub mod auth;
pub mod documentation;
pub mod projects;
pub mod tasks;
