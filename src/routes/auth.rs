use crate::{
    auth::{
        AuthResponse, CredentialStore, LoginRequest, MeResponse, Principal, RegisterRequest,
        TokenService,
    },
    error::{AppError, ErrorBody},
    validation::ValidatedJson,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates a new user account and returns it with a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
#[post("/register")]
pub async fn register(
    credentials: web::Data<CredentialStore>,
    tokens: web::Data<TokenService>,
    body: ValidatedJson<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let body = body.into_inner();
    let user = credentials
        .register(&body.email, &body.name, &body.password)
        .await?;
    let token = tokens.issue(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// Login user
///
/// Authenticates a user and returns a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
#[post("/login")]
pub async fn login(
    credentials: web::Data<CredentialStore>,
    tokens: web::Data<TokenService>,
    body: ValidatedJson<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let body = body.into_inner();
    let user = credentials.authenticate(&body.email, &body.password).await?;
    let token = tokens.issue(user.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse { user, token }))
}

/// Current user
///
/// Mounted behind `AuthMiddleware` in `routes::config`.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn me(
    credentials: web::Data<CredentialStore>,
    principal: Principal,
) -> Result<impl Responder, AppError> {
    let user = credentials.find_by_id(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(MeResponse { user }))
}
