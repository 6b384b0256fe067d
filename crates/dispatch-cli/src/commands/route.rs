//! `dispatch route` — print the routing decision for a request.

use dispatch_agents::AgentRegistry;
use dispatch_router::{RouteCache, Router, RouterError};

use crate::context::CommandContext;

/// Exit code for invalid routing input.
const EXIT_INVALID_INPUT: i32 = 2;

pub(crate) fn run(request: &str) -> i32 {
    let ctx = match CommandContext::resolve() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("dispatch: {e}");
            return 1;
        },
    };

    let registry = AgentRegistry::load(&ctx.agent_dirs());
    let mut router = Router::new(registry, ctx.config.clone()).with_semantic_from_env();
    if let Ok(cache_dir) = ctx.cache_dir() {
        router = router.with_cache(RouteCache::new(cache_dir, ctx.config.cache_ttl_days));
    }

    match router.route_checked(request) {
        Ok(decision) => match serde_json::to_string_pretty(&decision) {
            Ok(json) => {
                println!("{json}");
                0
            },
            Err(e) => {
                eprintln!("dispatch: cannot serialize decision: {e}");
                1
            },
        },
        Err(RouterError::InputInvalid { reason }) => {
            eprintln!("dispatch: invalid request: {reason}");
            EXIT_INVALID_INPUT
        },
    }
}
