//! Route paths. Everything below is nested under [`API_PREFIX`].

pub const API_PREFIX: &str = "/v1";

pub const GET_HEALTH: &str = "/health";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_USER_ME: &str = "/user/me";
pub const GET_USER_ID: &str = "/user/{id}";
