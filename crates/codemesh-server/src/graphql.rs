//! GraphQL surface: mirrors the REST surface; enums are UPPERCASE
//! on the wire and lowercase in the store. `async-graphql`'s `Enum`
//! derive already renders variant names SCREAMING_SNAKE_CASE, so the
//! wire mapping falls out of the derive rather than needing a manual
//! translation table; the `From` impls below do the lowercase-store
//! side of the mapping.

use std::str::FromStr;

use async_graphql::http::GraphiQLSource;
use async_graphql::{Context, EmptyMutation, EmptySubscription, Enum, Object, Schema, SimpleObject, ID};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use codemesh_core::enums::{Language as CoreLanguage, SymbolKind as CoreSymbolKind};
use codemesh_core::ids::ProjectId;
use codemesh_core::model::{Project as CoreProject, Symbol as CoreSymbol};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum SymbolKindGql {
    Table,
    View,
    Column,
    Procedure,
    Function,
    Trigger,
    Class,
    Interface,
    Struct,
    EnumType,
    Method,
    Property,
    Field,
    Module,
    Namespace,
    Endpoint,
    Constant,
    Type,
}

impl From<CoreSymbolKind> for SymbolKindGql {
    fn from(kind: CoreSymbolKind) -> Self {
        match kind {
            CoreSymbolKind::Table => Self::Table,
            CoreSymbolKind::View => Self::View,
            CoreSymbolKind::Column => Self::Column,
            CoreSymbolKind::Procedure => Self::Procedure,
            CoreSymbolKind::Function => Self::Function,
            CoreSymbolKind::Trigger => Self::Trigger,
            CoreSymbolKind::Class => Self::Class,
            CoreSymbolKind::Interface => Self::Interface,
            CoreSymbolKind::Struct => Self::Struct,
            CoreSymbolKind::Enum => Self::EnumType,
            CoreSymbolKind::Method => Self::Method,
            CoreSymbolKind::Property => Self::Property,
            CoreSymbolKind::Field => Self::Field,
            CoreSymbolKind::Module => Self::Module,
            CoreSymbolKind::Namespace => Self::Namespace,
            CoreSymbolKind::Endpoint => Self::Endpoint,
            CoreSymbolKind::Constant => Self::Constant,
            CoreSymbolKind::Type => Self::Type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum LanguageGql {
    TSql,
    Postgres,
    CSharp,
    JavaScript,
    TypeScript,
    AspClassic,
    Delphi,
    Java,
    Unknown,
}

impl From<CoreLanguage> for LanguageGql {
    fn from(language: CoreLanguage) -> Self {
        match language {
            CoreLanguage::TSql => Self::TSql,
            CoreLanguage::Postgres => Self::Postgres,
            CoreLanguage::CSharp => Self::CSharp,
            CoreLanguage::JavaScript => Self::JavaScript,
            CoreLanguage::TypeScript => Self::TypeScript,
            CoreLanguage::AspClassic => Self::AspClassic,
            CoreLanguage::Delphi => Self::Delphi,
            CoreLanguage::Java => Self::Java,
            CoreLanguage::Unknown => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct ProjectGql {
    pub id: ID,
    pub slug: String,
    pub name: String,
}

impl From<CoreProject> for ProjectGql {
    fn from(project: CoreProject) -> Self {
        Self {
            id: ID(project.id.to_string()),
            slug: project.slug,
            name: project.name,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct SymbolGql {
    pub id: ID,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKindGql,
    pub language: LanguageGql,
    pub signature: Option<String>,
    pub doc: Option<String>,
}

impl From<CoreSymbol> for SymbolGql {
    fn from(symbol: CoreSymbol) -> Self {
        Self {
            id: ID(symbol.id.to_string()),
            name: symbol.name,
            qualified_name: symbol.qualified_name,
            kind: symbol.kind.into(),
            language: symbol.language.into(),
            signature: symbol.signature,
            doc: symbol.doc,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn projects(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProjectGql>> {
        let state = ctx.data::<AppState>()?;
        let projects = state.store.list_projects(state.default_tenant).await.map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(projects.into_iter().map(Into::into).collect())
    }

    async fn project(&self, ctx: &Context<'_>, slug: String) -> async_graphql::Result<ProjectGql> {
        let state = ctx.data::<AppState>()?;
        let project = state
            .store
            .get_project_by_slug(state.default_tenant, &slug)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(project.into())
    }

    async fn symbol(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<SymbolGql> {
        let state = ctx.data::<AppState>()?;
        let symbol_id = Uuid::from_str(&id)?.into();
        let symbol = state.store.get_symbol(symbol_id).await.map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(symbol.into())
    }

    async fn search_symbols(
        &self,
        ctx: &Context<'_>,
        project: ID,
        query: String,
        limit: Option<i64>,
    ) -> async_graphql::Result<Vec<SymbolGql>> {
        let state = ctx.data::<AppState>()?;
        let project_id: ProjectId = Uuid::from_str(&project)?.into();
        let symbols = state
            .store
            .search_symbols(project_id, &query, limit.unwrap_or(20).clamp(1, 200))
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(symbols.into_iter().map(Into::into).collect())
    }
}

pub type CodemeshSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/api/v1/graphql").finish())
}

/// Built fresh per request rather than cached on `AppState`: the schema
/// is stateless, and this keeps request-scoped data (`AppState` itself,
/// handed to resolvers via `ctx.data`) threading through the normal
/// axum `State` extractor instead of a second side channel.
async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    let schema: CodemeshSchema = Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish();
    schema.execute(req.into_inner().data(state)).await.into()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/graphql", get(graphiql).post(graphql_handler))
}
