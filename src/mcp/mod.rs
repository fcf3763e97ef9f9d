//! MCP server for the listing search engine.
//!
//! Exposes hybrid search as Model Context Protocol tools so LLM
//! assistants can query the listing corpus conversationally:
//!    - `search_real_estate` runs the full hybrid pipeline
//!    - `get_database_stats` reports corpus counts
//!
//! The default transport is stdio; an SSE/HTTP transport lives in
//! [`http_server`] behind the `http-server` feature.

pub mod http_server;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, *},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::search::{RankedListing, SearchEngine, SearchStatus};
use crate::types::Listing;

/// The whole description fits in a tool response; long listing texts
/// are previewed to keep responses readable.
const DESCRIPTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SearchRealEstateRequest {
    /// Natural-language query, Polish or English. Structured
    /// constraints (city, price cap, room count, amenities) are
    /// extracted automatically, e.g. "2-pokojowe na Mokotowie do 800
    /// tys z balkonem".
    pub query: String,
    /// Maximum number of results to return. Uses the configured
    /// default when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct GetDatabaseStatsRequest {}

/// MCP-facing wrapper around [`SearchEngine`].
#[derive(Clone)]
pub struct ListingSearchServer {
    engine: SearchEngine,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ListingSearchServer {
    #[must_use]
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search real estate listings with a natural-language query. \
        Combines semantic similarity with structured constraints extracted from the \
        query text (city, district, price range, room count, rent/sale, amenities)."
    )]
    pub async fn search_real_estate(
        &self,
        Parameters(SearchRealEstateRequest { query, max_results }): Parameters<
            SearchRealEstateRequest,
        >,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .engine
            .search(&query, max_results)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let text = match outcome.status {
            SearchStatus::EmptyQuery => {
                "Query is empty. Describe what you are looking for, e.g. \
                 'dwupokojowe mieszkanie w Warszawie do 800 tysiecy'."
                    .to_string()
            }
            SearchStatus::NoResults => {
                format!("No listings matched '{query}'. Try relaxing the constraints.")
            }
            SearchStatus::Ok | SearchStatus::Degraded => {
                let mut out = format!(
                    "Found {} listing(s) for '{}':\n\n",
                    outcome.results.len(),
                    query
                );
                if outcome.is_degraded() {
                    out.push_str(
                        "Note: semantic ranking unavailable, results match \
                         the structured constraints only, cheapest first.\n\n",
                    );
                }
                for (i, ranked) in outcome.results.iter().enumerate() {
                    format_result(&mut out, i + 1, ranked);
                }
                out
            }
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Get statistics about the listing database: total listing count \
        and the split between rental and sale offers."
    )]
    pub async fn get_database_stats(
        &self,
        Parameters(GetDatabaseStatsRequest {}): Parameters<GetDatabaseStatsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let stats = self
            .engine
            .stats()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let text = format!(
            "Listing database statistics:\n\
             - Total listings: {}\n\
             - For rent: {}\n\
             - For sale: {}",
            stats.total_listings, stats.rent_listings, stats.sale_listings
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

fn format_result(out: &mut String, rank: usize, ranked: &RankedListing) {
    let l = &ranked.listing;
    out.push_str(&format!("{rank}. {}\n", l.title));
    out.push_str(&format!(
        "   {} in {}{}\n",
        match l.listing_type {
            crate::types::ListingType::Rent => "For rent",
            crate::types::ListingType::Sale => "For sale",
        },
        l.city,
        l.district
            .as_deref()
            .map(|d| format!(", {d}"))
            .unwrap_or_default(),
    ));
    if let Some(price) = l.price {
        out.push_str(&format!("   Price: {price:.0} PLN\n"));
    }
    let mut attrs = Vec::new();
    if let Some(rooms) = l.room_count {
        attrs.push(format!("{rooms} room(s)"));
    }
    if let Some(space) = l.space_sm {
        attrs.push(format!("{space:.0} m2"));
    }
    if let Some(year) = l.build_year {
        attrs.push(format!("built {year}"));
    }
    if !attrs.is_empty() {
        out.push_str(&format!("   {}\n", attrs.join(", ")));
    }
    if let Some(preview) = description_preview(l) {
        out.push_str(&format!("   {preview}\n"));
    }
    if !l.link.is_empty() {
        out.push_str(&format!("   Link: {}\n", l.link));
    }
    out.push_str(&format!("   Relevance: {:.3}\n\n", ranked.score));
}

fn description_preview(listing: &Listing) -> Option<String> {
    let description = listing.description.trim();
    if description.is_empty() {
        return None;
    }
    let mut preview: String = description
        .chars()
        .take(DESCRIPTION_PREVIEW_CHARS)
        .collect();
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        preview.push_str("...");
    }
    Some(preview)
}

#[tool_handler]
impl ServerHandler for ListingSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mieszko".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::default()
            },
            instructions: Some(
                "This server searches Polish real-estate listings. Use \
                 'search_real_estate' with a natural-language query; city, district, \
                 price limits, room counts, rent/sale intent, and amenities mentioned \
                 in the query become hard constraints, the remaining text ranks \
                 results semantically. Use 'get_database_stats' to see corpus size."
                    .to_string(),
            ),
        }
    }
}
