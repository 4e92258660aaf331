//! # Agent Scout
//!
//! Discovery, caching, and compatibility matching for agent capability
//! profiles published as markdown documents in remote repositories.
//!
//! Agent Scout keeps a registry of repository sources, fetches their agent
//! definition documents through a pluggable [`fetch::DocumentFetcher`],
//! parses them into structured [`models::AgentDefinition`]s, caches parses
//! with a TTL, indexes them along several dimensions, and ranks them against
//! a project's characteristics.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────┐   ┌───────┐
//! │ Registry │──▶│  Fetch  │──▶│ Parser │──▶│ Cache │
//! │  (YAML)  │   │ (trait) │   │ (md)   │   │ (TTL) │
//! └──────────┘   └─────────┘   └───┬────┘   └───────┘
//!                                  │
//!                                  ▼
//!                            ┌──────────┐   ┌────────┐
//!                            │  Index   │──▶│ Scorer │
//!                            │ (lookup) │   │ (rank) │
//!                            └──────────┘   └────────┘
//! ```
//!
//! The [`scanner::ScanOrchestrator`] drives the flow end to end with bounded
//! parallelism across repositories and documents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agent_scout::registry::RepositoryRegistry;
//! use agent_scout::scanner::ScanOrchestrator;
//! use agent_scout::models::ProjectProfile;
//! # use agent_scout::fetch::DocumentFetcher;
//! # async fn run(fetcher: Arc<dyn DocumentFetcher>) -> anyhow::Result<()> {
//! let registry = RepositoryRegistry::load("repositories.yaml")?;
//! let orchestrator = ScanOrchestrator::new(registry, fetcher);
//!
//! let result = orchestrator.scan(false).await;
//! println!("parsed {} agents", result.successful_parses);
//!
//! let project = ProjectProfile {
//!     language: Some("python".to_string()),
//!     ..Default::default()
//! };
//! for candidate in orchestrator.find_compatible_agents(&project, 5) {
//!     println!("{} {:.2}", candidate.agent.name, candidate.compatibility_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`registry`] | Repository source registry with YAML persistence |
//! | [`fetch`] | Document fetching seam |
//! | [`parser`] | Markdown agent definition parsing |
//! | [`cache`] | TTL cache over parsed definitions |
//! | [`index`] | Multi-dimensional capability index |
//! | [`scorer`] | Project compatibility scoring |
//! | [`scanner`] | Scan and sync orchestration |

pub mod cache;
pub mod fetch;
pub mod index;
pub mod models;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod scorer;
