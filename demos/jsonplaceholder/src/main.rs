//! JSONPlaceholder demo
//!
//! Demonstrates typed endpoints, query/JSON/multipart encodings, interceptors
//! and upload progress against <https://jsonplaceholder.typicode.com>.

// Demo-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(dead_code)]

use std::path::Path;

use resting::interceptors::LoggingInterceptor;
use resting::prelude::*;
use resting::{DynamicHeaderProvider, RestingClient};

// ============================================================================
// Data Types
// ============================================================================

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Body of a new or replaced post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Filters for the post listing.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

/// A post with an attached file, sent as a multipart form.
#[derive(Debug, Clone, Serialize)]
pub struct PostAttachment {
    pub title: String,
    pub created: Date,
    pub file: FileRef,
}

/// Server answer to a create call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: u64,
}

// ============================================================================
// Endpoints
// ============================================================================

const LIST_POSTS: Endpoint<PostFilter, Vec<Post>> = Endpoint::get("/posts");
const GET_POST: Endpoint<Nothing, Post> = Endpoint::get("/posts/{{id}}");
const CREATE_POST: Endpoint<PostDraft, Post> = Endpoint::post("/posts");
const UPDATE_POST: Endpoint<PostDraft, Post> = Endpoint::put("/posts/{{id}}");
const DELETE_POST: Endpoint<Nothing, Nothing> = Endpoint::delete("/posts/{{id}}");
const ATTACH: Endpoint<PostAttachment, Created> = Endpoint::multipart("/posts");

// ============================================================================
// API
// ============================================================================

/// JSONPlaceholder API, built once and passed around.
#[derive(Debug, Clone)]
pub struct PostsApi {
    client: RestingClient,
}

impl PostsApi {
    pub fn new(base_url: impl Into<String>) -> resting::Result<Self> {
        let headers = DynamicHeaderProvider::new();
        headers.add("Accept", "application/json");

        let client = RestingClient::builder(base_url)
            .header_provider(headers)
            .interceptor(LoggingInterceptor::new())
            .build()?;
        Ok(Self { client })
    }

    pub async fn list(&self, user_id: Option<u64>) -> resting::Result<Vec<Post>> {
        let request = Request::new(LIST_POSTS, PostFilter { user_id });
        Ok(self.client.perform(request).await?.into_body())
    }

    pub async fn get(&self, id: u64) -> resting::Result<Post> {
        let request = Request::builder(GET_POST, Nothing)
            .path_variable("id", id)
            .build();
        Ok(self.client.perform(request).await?.into_body())
    }

    pub async fn create(&self, draft: PostDraft) -> resting::Result<Post> {
        Ok(self
            .client
            .perform(Request::new(CREATE_POST, draft))
            .await?
            .into_body())
    }

    pub async fn update(&self, id: u64, draft: PostDraft) -> resting::Result<Post> {
        let request = Request::builder(UPDATE_POST, draft)
            .path_variable("id", id)
            .build();
        Ok(self.client.perform(request).await?.into_body())
    }

    pub async fn delete(&self, id: u64) -> resting::Result<u16> {
        let request = Request::builder(DELETE_POST, Nothing)
            .path_variable("id", id)
            .build();
        Ok(self.client.perform_empty(request).await?.status())
    }

    pub async fn attach(&self, title: &str, file: &Path) -> resting::Result<Created> {
        let attachment = PostAttachment {
            title: title.to_string(),
            created: Date::now(),
            file: FileRef::new(file),
        };
        let created = self
            .client
            .upload(Request::new(ATTACH, attachment))
            .on_progress(|event| {
                println!(
                    "  uploaded {}/{} bytes ({:.0}%)",
                    event.completed,
                    event.total,
                    event.fraction() * 100.0
                );
            })
            .await?
            .into_body();
        Ok(created)
    }
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() -> resting::Result<()> {
    let api = PostsApi::new("https://jsonplaceholder.typicode.com/")?;

    let posts = api.list(Some(1)).await?;
    println!("user 1 wrote {} posts", posts.len());

    let post = api.get(1).await?;
    println!("post 1: {}", post.title);

    let created = api
        .create(PostDraft {
            user_id: 1,
            title: "resting".to_string(),
            body: "typed endpoints".to_string(),
        })
        .await?;
    println!("created post {}", created.id);

    let status = api.delete(1).await?;
    println!("delete answered {status}");

    let file = std::env::temp_dir().join("resting-demo.txt");
    std::fs::write(&file, "attached from the resting demo\n")?;
    let attached = api.attach("with attachment", &file).await;
    std::fs::remove_file(&file)?;
    println!("attachment answered {:?}", attached.map(|created| created.id));

    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================
