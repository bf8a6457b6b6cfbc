pub mod admin;
pub mod auth;
pub mod products;
pub mod twofa;

mod render;

// Internal "interpreter" for `Action`.
// The match lives in a separate module so `mod.rs` stays small.
mod run;

#[derive(Debug)]
pub enum Action {
    Auth(auth::Args),
    TwoFactor(twofa::Args),
    Products(products::Args),
    Admin(admin::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the guard rejects the command or the request fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
