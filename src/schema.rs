//! Schema mounted by the GraphQL view.
//!
//! `Query` is the fixed root value. The mutations read uploaded files so the
//! multipart paths can be exercised end to end.

use std::io::Read as _;

use async_graphql::{Context, EmptySubscription, InputObject, Object, Result, Schema, Upload};

use crate::context::TestContext;

/// Schema type served by [`crate::http::GraphQLView`].
pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

#[derive(Debug, Default, Clone, Copy)]
pub struct Query;

#[Object]
impl Query {
    /// Greets `name`, or the world when omitted.
    async fn hello(&self, name: Option<String>) -> String {
        format!("Hello {}", name.as_deref().unwrap_or("world"))
    }

    /// The `custom_value` of the request context.
    async fn value_from_context(&self, ctx: &Context<'_>) -> Result<String> {
        Ok(ctx.data::<TestContext>()?.custom_value.clone())
    }

    /// A request header by lower-case name.
    async fn header(&self, ctx: &Context<'_>, name: String) -> Result<Option<String>> {
        Ok(ctx
            .data::<TestContext>()?
            .headers
            .get(&name.to_ascii_lowercase())
            .cloned())
    }

    async fn always_fail(&self) -> Result<Option<String>> {
        Err("You are not authorized".into())
    }
}

/// A folder of uploads, nested one level inside the variables.
#[derive(InputObject)]
pub struct FolderInput {
    pub files: Vec<Upload>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Mutation;

#[Object]
impl Mutation {
    /// Contents of a single uploaded text file.
    async fn read_text(&self, ctx: &Context<'_>, text_file: Upload) -> Result<String> {
        read_upload(ctx, &text_file)
    }

    /// Contents of each uploaded file, in order.
    async fn read_files(&self, ctx: &Context<'_>, files: Vec<Upload>) -> Result<Vec<String>> {
        files.iter().map(|file| read_upload(ctx, file)).collect()
    }

    async fn read_folder(&self, ctx: &Context<'_>, folder: FolderInput) -> Result<Vec<String>> {
        folder
            .files
            .iter()
            .map(|file| read_upload(ctx, file))
            .collect()
    }
}

fn read_upload(ctx: &Context<'_>, upload: &Upload) -> Result<String> {
    let mut text = String::new();
    upload.value(ctx)?.into_read().read_to_string(&mut text)?;
    Ok(text)
}

/// Build the schema with [`Query`] as its root value.
#[must_use]
pub fn build_schema() -> AppSchema {
    Schema::build(Query, Mutation, EmptySubscription).finish()
}
