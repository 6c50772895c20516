//! Composed OpenAPI documentation for the Lookbook API

use utoipa::OpenApi;

use crate::agent::{AskRequest, AskResponse};

#[derive(OpenApi)]
#[openapi(
    nest(
        (path = "/", api = domain_retrieval::RetrievalApiDoc)
    ),
    paths(crate::agent::ask),
    components(schemas(AskRequest, AskResponse)),
    tags(
        (name = "agent", description = "Conversational retrieval wrapper")
    )
)]
pub struct ApiDoc;
