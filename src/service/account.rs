use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    db::EventStore,
    dto::{LoginRequest, LoginResponse, NewAccountDto, UpdateProfileDto},
    errors::AppError,
    models::{Account, Capabilities, Profile, Role},
    service::auth::{jwt, Caller},
    state::AppState,
};

use super::crypto;

/// A caller with its roles resolved from the store.
#[derive(Debug, Clone)]
pub struct Actor {
    pub account_id: Uuid,
    pub capabilities: Capabilities,
    pub profiles: Vec<Profile>,
}

impl Actor {
    pub fn from_parts(account: &Account, profiles: Vec<Profile>) -> Self {
        let mut capabilities = profiles
            .iter()
            .fold(Capabilities::empty(), |caps, p| caps | p.role.capabilities());
        if account.is_admin {
            capabilities |= Capabilities::REVIEW_EVENTS;
        }
        Self {
            account_id: account.id,
            capabilities,
            profiles,
        }
    }

    pub fn can(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn require(&self, capability: Capabilities, message: &str) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            warn!("account {} lacks {:?}", self.account_id, capability);
            Err(AppError::forbidden(message))
        }
    }

    pub fn profile(&self, role: Role) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.role == role)
    }

    pub fn is_admin(&self) -> bool {
        self.can(Capabilities::REVIEW_EVENTS)
    }
}

pub async fn resolve(store: &dyn EventStore, caller: &Caller) -> Result<Actor, AppError> {
    let account = store.get_account(caller.account_id).await.map_err(|err| match err {
        AppError::NotFound(_) => AppError::Unauthorized("account no longer exists".to_string()),
        other => other,
    })?;
    let profiles = store.list_profiles(account.id).await?;
    Ok(Actor::from_parts(&account, profiles))
}

/// Returns the caller's profile for `role`, creating it on first access.
pub async fn ensure_role(store: &dyn EventStore, actor: &mut Actor, role: Role) -> Result<Profile, AppError> {
    if let Some(profile) = actor.profile(role) {
        return Ok(profile.clone());
    }
    let (profile, created) = store.ensure_profile(actor.account_id, role).await?;
    if created {
        info!("created {} profile for account {}", role, actor.account_id);
    }
    actor.capabilities |= role.capabilities();
    actor.profiles.push(profile.clone());
    Ok(profile)
}

fn new_account(name: &str, email: &str, password: &str, is_admin: bool) -> Account {
    let pwd_salt = crypto::random_token(16);
    Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: name.to_string(),
        pwd_hash: crypto::get_sha3_256_hash(&pwd_salt, password),
        pwd_salt,
        is_admin,
        created_at: Utc::now(),
    }
}

async fn ensure_all_profiles(store: &dyn EventStore, account_id: Uuid) -> Result<bool, AppError> {
    let mut created_any = false;
    for role in Role::ALL {
        let (_, created) = store.ensure_profile(account_id, role).await?;
        created_any |= created;
    }
    Ok(created_any)
}

/// Creates an account holding both the student and the organizer role.
pub async fn signup(store: &dyn EventStore, dto: NewAccountDto) -> Result<Account, AppError> {
    let NewAccountDto {
        name,
        email,
        password,
        confirm_password,
    } = dto;
    let email = email.trim().to_lowercase();
    let password = password.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email address is required."));
    }
    if password.is_empty() || confirm_password.trim().is_empty() {
        return Err(AppError::validation("Both password fields are required."));
    }
    if password != confirm_password.trim() {
        return Err(AppError::validation(
            "Passwords do not match. Please ensure both password fields are identical.",
        ));
    }
    if store.find_account_by_email(&email).await?.is_some() {
        return Err(AppError::conflict(
            "An account with this email already exists. Please log in instead.",
        ));
    }
    let account = new_account(name.trim(), &email, password, false);
    store.create_account(&account).await?;
    ensure_all_profiles(store, account.id).await?;
    info!("account {} signed up", account.id);
    Ok(account)
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let store = state.store.as_ref();
    let email = req.email.trim().to_lowercase();
    let account = store.find_account_by_email(&email).await?.ok_or_else(|| {
        AppError::not_found("No account found with this email address. Please sign up to create a new account.")
    })?;
    if !crypto::verify_password(&account.pwd_salt, req.password.trim(), &account.pwd_hash) {
        warn!("failed login for account {}", account.id);
        return Err(AppError::Unauthorized(
            "Incorrect email or password. Please check your credentials and try again.".to_string(),
        ));
    }
    let profiles_created = ensure_all_profiles(store, account.id).await?;
    let expires_at = Utc::now() + state.config.access_token_ttl;
    let sid = state.sessions.open(account.id, expires_at)?;
    let access_token = jwt::create(&state.config.jwt_secret, &account, sid, expires_at)?;
    info!("account {} logged in", account.id);
    Ok(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.access_token_ttl.num_seconds(),
        account,
        profiles_created,
    })
}

/// Creates the configured administrator account if it does not exist yet.
/// Returns whether the account behind `email` is an administrator.
pub async fn ensure_admin(store: &dyn EventStore, email: &str, password: &str) -> Result<bool, AppError> {
    let email = email.trim().to_lowercase();
    if let Some(existing) = store.find_account_by_email(&email).await? {
        if !existing.is_admin {
            warn!(
                "account {} already uses {} and is not an administrator; no administrator was configured",
                existing.id, email
            );
        }
        return Ok(existing.is_admin);
    }
    let account = new_account("Administrator", &email, password.trim(), true);
    store.create_account(&account).await?;
    info!("administrator account {} created", account.id);
    Ok(true)
}

pub async fn update_profile(
    store: &dyn EventStore,
    caller: &Caller,
    role: Role,
    dto: UpdateProfileDto,
) -> Result<Profile, AppError> {
    let mut actor = resolve(store, caller).await?;
    let profile = ensure_role(store, &mut actor, role).await?;
    let contact_number = dto.contact_number.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let avatar = dto.avatar.as_deref().map(str::trim).filter(|v| !v.is_empty());
    if contact_number.is_none() && avatar.is_none() {
        return Ok(profile);
    }
    let updated = store.update_profile_contact(profile.id, contact_number, avatar).await?;
    info!("{} profile {} updated", role, updated.id);
    Ok(updated)
}
