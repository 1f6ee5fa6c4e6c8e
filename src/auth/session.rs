use tracing::{error, info};

use crate::auth::storage::{CredentialStore, ACCESS_KEY, REFRESH_KEY};
use crate::navigation::{Navigator, AUTH_SCREEN};

/// Delete both tokens, then send the user to the login screen.
///
/// Storage failures are logged and otherwise ignored; the user is always
/// navigated away.
pub async fn sign_out(store: &dyn CredentialStore, navigator: &dyn Navigator) {
    for key in [ACCESS_KEY, REFRESH_KEY] {
        if let Err(e) = store.delete(key).await {
            error!(key = %key, error = %e, "Failed to delete credential during sign-out");
        }
    }

    info!("Session ended, redirecting to login");
    navigator.navigate_replace(AUTH_SCREEN);
}
