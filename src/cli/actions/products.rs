use super::{render, run::enter};
use crate::{
    api::products,
    cli::{commands::products::Options, globals::GlobalArgs},
    session::Route,
};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub options: Options,
}

/// Execute a catalog command. The catalog is public.
/// # Errors
/// Returns an error if the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let session = enter(&args.globals, Route::Products).await?;
    let client = session.auth.client();

    match args.options {
        Options::List { category } => {
            let items = products::list(client, category.as_deref())
                .await
                .context("could not load products")?;
            println!("{}", render::products(&items));
            if items.is_empty() && category.is_some() {
                println!(
                    "Known categories: {}",
                    products::SUGGESTED_CATEGORIES.join(", ")
                );
            }
        }
        Options::Show { id } => {
            let product = products::get(client, id)
                .await
                .with_context(|| format!("could not load product {id}"))?;
            println!("{}", render::product(&product));
        }
    }
    Ok(())
}
