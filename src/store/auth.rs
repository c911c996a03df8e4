use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ProfileUpdate, ShopApi};
use crate::error::{Result, ShopError};
use crate::types::{AuthSession, User};

use super::{RequestStatus, Store};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AuthSlice {
    session: Option<AuthSession>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl AuthSlice {
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn require_user(&self) -> Result<&User> {
        self.user().ok_or(ShopError::NotLoggedIn)
    }

    pub fn require_admin(&self) -> Result<&User> {
        let user = self.require_user()?;
        if user.is_admin {
            Ok(user)
        } else {
            Err(ShopError::NotAdmin)
        }
    }

    pub fn set_session(&mut self, session: AuthSession) {
        self.session = Some(session);
    }

    pub fn set_user(&mut self, user: User) {
        if let Some(session) = self.session.as_mut() {
            session.user = user;
        }
    }

    fn take_session(&mut self) -> Option<AuthSession> {
        self.session.take()
    }
}

/// Sign in and replace any previous session. Data cached for a different
/// user is discarded.
pub async fn login<A: ShopApi>(api: &A, store: &mut Store, email: &str, password: &str) -> Result<User> {
    store.auth.status = RequestStatus::Loading;
    let session = store.auth.status.settle(api.login(email, password).await)?;
    adopt_session(store, session)
}

pub async fn register<A: ShopApi>(
    api: &A,
    store: &mut Store,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    store.auth.status = RequestStatus::Loading;
    let session = store
        .auth
        .status
        .settle(api.register(name, email, password).await)?;
    adopt_session(store, session)
}

fn adopt_session(store: &mut Store, session: AuthSession) -> Result<User> {
    let previous = store.auth.user().map(|u| u.id.clone());
    if previous.as_deref() != Some(session.user.id.as_str()) {
        store.clear_user_data();
    }

    let user = session.user.clone();
    info!(user = %user.email, "signed in");
    store.auth.set_session(session);
    Ok(user)
}

/// Forget the session along with every user-scoped cache.
pub fn logout(store: &mut Store) -> Option<User> {
    store.clear_user_data();
    store.auth.status = RequestStatus::Idle;
    store.auth.take_session().map(|s| s.user)
}

pub async fn refresh_profile<A: ShopApi>(api: &A, store: &mut Store) -> Result<User> {
    store.auth.require_user()?;
    store.auth.status = RequestStatus::Loading;
    let user = store.auth.status.settle(api.profile().await)?;
    store.auth.set_user(user.clone());
    Ok(user)
}

pub async fn update_profile<A: ShopApi>(
    api: &A,
    store: &mut Store,
    update: &ProfileUpdate,
) -> Result<User> {
    store.auth.require_user()?;
    store.auth.status = RequestStatus::Loading;
    let user = store.auth.status.settle(api.update_profile(update).await)?;
    store.auth.set_user(user.clone());
    Ok(user)
}
