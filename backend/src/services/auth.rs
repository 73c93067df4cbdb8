use crate::error::{AppError, AppResult, RepoError};
use crate::models::{NewUser, User};
use crate::repository::UserRepository;
use crate::state::AppState;
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (User ID)
    pub exp: usize,  // Expiration
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid user ID".to_string()))
    }
}

impl FromRequest for Claims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).map_err(Into::into))
    }
}

fn claims_from_request(req: &HttpRequest) -> AppResult<Claims> {
    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("No Auth header".to_string()))?;
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))?;
    state.tokens.decode(&token)
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Password hashing seam so credential checks can be observed in tests.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, String>;
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, String>;
}

pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        hash_password(password)
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, String> {
        verify_password(password, password_hash)
    }
}

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_hours: u64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    pub fn issue(&self, user_id: i32) -> AppResult<String> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .as_secs()
            + self.ttl_hours * 3600;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Error creating token: {}", e)))
    }

    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid Token".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn signup(&self, email: &str, name: &str, password: &str) -> AppResult<AuthPayload> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.users.find_user_by_email(&email)?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| AppError::Internal(format!("Error hashing password: {}", e)))?;

        let user = self
            .users
            .insert_user(NewUser {
                email,
                name: name.to_string(),
                password_hash,
            })
            .map_err(|err| match err {
                RepoError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
                other => other.into(),
            })?;

        log::info!("User {} signed up", user.id);
        let token = self.tokens.issue(user.id)?;
        Ok(AuthPayload { token, user })
    }

    pub fn login(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let email = email.trim().to_lowercase();
        let user = self.users.find_user_by_email(&email)?.ok_or_else(invalid)?;

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => {
                let token = self.tokens.issue(user.id)?;
                Ok(AuthPayload { token, user })
            }
            Ok(false) => Err(invalid()),
            Err(e) => {
                log::warn!("Stored password hash for user {} is unreadable: {}", user.id, e);
                Err(invalid())
            }
        }
    }

    pub fn me(&self, user_id: i32) -> AppResult<User> {
        self.users
            .find_user(user_id)?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::validation("Invalid email address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use mockall::predicate::eq;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 24)
    }

    fn service_with(hasher: MockPasswordHasher) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(store.clone(), Arc::new(hasher), issuer());
        (service, store)
    }

    #[test]
    fn test_hash_password_returns_valid_hash() {
        let hash = hash_password("my_secure_password").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_hash_password_produces_different_hashes_for_same_password() {
        let hash1 = hash_password("my_secure_password").unwrap();
        let hash2 = hash_password("my_secure_password").unwrap();

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_and_incorrect() {
        let hash = hash_password("my_secure_password").unwrap();
        assert!(verify_password("my_secure_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
    }

    #[test]
    fn test_token_contains_user_id_and_expires_in_future() {
        let tokens = issuer();
        let token = tokens.issue(123).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.sub, "123");
        assert_eq!(claims.user_id().unwrap(), 123);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        assert!(claims.exp > now);
        assert!(claims.exp <= now + 24 * 3600 + 1);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = TokenIssuer::new("other", 24).issue(1).unwrap();
        assert!(matches!(
            issuer().decode(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_signup_normalizes_email_and_returns_token() {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .with(eq("password123"))
            .times(1)
            .returning(|_| Ok("hashed".to_string()));
        let (service, _) = service_with(hasher);

        let payload = service
            .signup("  Alice@Example.COM ", "Alice", "password123")
            .unwrap();

        assert_eq!(payload.user.email, "alice@example.com");
        assert_eq!(payload.user.password_hash, "hashed");
        assert_eq!(
            issuer().decode(&payload.token).unwrap().user_id().unwrap(),
            payload.user.id
        );
    }

    #[test]
    fn test_signup_duplicate_email_is_conflict_without_second_row() {
        let mut hasher = MockPasswordHasher::new();
        // Only the first signup reaches the hasher.
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("hashed".to_string()));
        let (service, store) = service_with(hasher);

        let first = service.signup("bob@example.com", "Bob", "password123").unwrap();
        let second = service.signup("BOB@example.com", "Bobby", "password456");

        assert!(matches!(second, Err(AppError::Conflict(_))));
        let stored = store.find_user_by_email("bob@example.com").unwrap().unwrap();
        assert_eq!(stored.id, first.user.id);
        assert_eq!(stored.name, "Bob");
        assert!(store.find_user(first.user.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_signup_validation() {
        let (service, _) = service_with(MockPasswordHasher::new());

        assert!(matches!(
            service.signup("not-an-email", "X", "password123"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.signup("x@example.com", "X", "short"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.signup("x@example.com", "  ", "password123"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_login_unknown_email_never_calls_verifier() {
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().never();
        let (service, _) = service_with(hasher);

        let result = service.login("ghost@example.com", "password123");

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_login_wrong_password_is_unauthorized() {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("hashed".to_string()));
        hasher
            .expect_verify()
            .with(eq("wrong-password"), eq("hashed"))
            .times(1)
            .returning(|_, _| Ok(false));
        let (service, _) = service_with(hasher);
        service.signup("carol@example.com", "Carol", "password123").unwrap();

        let result = service.login("carol@example.com", "wrong-password");

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_login_success_issues_token() {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("hashed".to_string()));
        hasher.expect_verify().returning(|_, _| Ok(true));
        let (service, _) = service_with(hasher);
        let created = service.signup("dan@example.com", "Dan", "password123").unwrap();

        let payload = service.login("DAN@example.com", "password123").unwrap();

        assert_eq!(payload.user.id, created.user.id);
        assert_eq!(service.me(created.user.id).unwrap().email, "dan@example.com");
    }
}
