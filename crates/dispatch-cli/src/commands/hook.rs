//! `dispatch hook <name>` — run a host lifecycle hook.
//!
//! The one command whose exit code is always 0: a hook failure must
//! never block the host. Problems surface on stderr and nothing else.

use dispatch_core::HookKind;
use dispatch_hooks::{HookInput, HookRuntime};

pub(crate) fn run(name: &str) -> i32 {
    let Ok(kind) = name.parse::<HookKind>() else {
        // An unknown name means a bad registration, not a bad prompt;
        // still exit 0 so the host proceeds.
        eprintln!("dispatch: unknown hook '{name}' (expected one of: prompt-submit, agent-start, agent-stop, session-start, session-end, pre-tool-use)");
        return 0;
    };

    let input = HookInput::from_reader(&mut std::io::stdin().lock());

    let runtime = match HookRuntime::for_input(&input) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[dispatch] hook skipped: {e}");
            return 0;
        },
    };

    let outcome = runtime.run(kind, &input);
    if !outcome.stdout.is_empty() {
        print!("{}", outcome.stdout);
    }
    for line in &outcome.stderr {
        eprintln!("{line}");
    }
    0
}
