use actix_web::{web, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};

use super::jwt::generate_access_token;
use super::middleware::authenticated_user_id;
use super::model::{LoginRequest, SignupRequest, TokenResponse, UserInfo};
use super::store::AuthStoreError;
use crate::{AppState, ErrorResponse};

const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid or duplicate email", body = ErrorResponse)
    )
)]
pub async fn signup(state: web::Data<AppState>, body: web::Json<SignupRequest>) -> impl Responder {
    let email = normalize_email(&body.email);
    if email.is_empty() || !email.contains('@') {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request("Invalid email address"));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = match hash(&body.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Failed to hash password: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Signup failed"));
        }
    };

    match state.users.create_user(&email, &password_hash).await {
        Ok(user) => {
            log::info!("User {} registered", user.id);
            HttpResponse::Created().json(UserInfo::from(user))
        }
        Err(AuthStoreError::EmailTaken(_)) => {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request("User already exists"))
        }
        Err(e) => {
            log::error!("Database error during signup: {:?}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Signup failed"))
        }
    }
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let invalid_credentials = || {
        HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "Invalid email or password"))
    };

    let user = match state.users.get_user_by_email(&normalize_email(&body.email)).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => return invalid_credentials(),
        Err(e) => {
            log::error!("Database error during login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Login failed"));
        }
    };

    if !verify(&body.password, &user.password_hash).unwrap_or(false) {
        return invalid_credentials();
    }

    match generate_access_token(&state.jwt, &user.id.to_string(), &user.email) {
        Ok(access_token) => HttpResponse::Ok().json(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.jwt.access_token_ttl_secs,
        }),
        Err(e) => {
            log::error!("Failed to generate access token: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to generate token"))
        }
    }
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = UserInfo),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let user_id = match authenticated_user_id(&req, &state.jwt) {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    match state.users.get_user_by_id(user_id).await {
        Ok(Some(user)) => HttpResponse::Ok().json(UserInfo::from(user)),
        Ok(None) => HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "User no longer exists")),
        Err(e) => {
            log::error!("Database error loading user: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load user"))
        }
    }
}

/// Configure auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/signup").route(web::post().to(signup)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/me").route(web::get().to(me)));
}
