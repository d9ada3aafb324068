//! Plugin orchestration.
//!
//! Processes every plugin reference applicable to a task role in ascending
//! declaration order: resolve its parameters, run its init script, then
//! collect the per-plugin command scripts it produced. One plugin's failing
//! init script never blocks the plugins after it; each ref yields an
//! outcome in the run report instead.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::commands::{CommandSet, RUNTIME_DIR};
use crate::error::Result;
use crate::jobconfig::JobConfig;
use crate::plugin::load_descriptor;
use crate::resolver::{resolve_references, value_to_string};
use crate::utils::command::run_streamed;
use crate::utils::io::ensure_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    /// Restricted to task roles that do not include the current one.
    Skipped,
    Succeeded,
    /// Init script failed to spawn or exited non-zero; later plugins
    /// still ran.
    InitFailed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOutcome {
    pub index: usize,
    pub plugin: String,
    pub status: PluginStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub emitted_pre: bool,
    pub emitted_post: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub task_role: String,
    pub plugins: Vec<PluginOutcome>,
    pub pre_commands: usize,
    pub post_commands: usize,
}

fn plugin_script_path(base: &Path, phase: &str, index: usize) -> PathBuf {
    base.join(RUNTIME_DIR)
        .join(format!("plugin_{}{}.sh", phase, index))
}

/// Process all plugin references under `namespace` for `taskrole`,
/// accumulating produced commands into `commands`.
///
/// Fatal errors: an unresolvable parameter reference, an unreadable plugin
/// descriptor, or an unwritable runtime directory. A failing init script is
/// recorded and skipped over.
pub fn init_plugins(
    job: &JobConfig,
    commands: &mut CommandSet,
    base: &Path,
    taskrole: &str,
    namespace: &str,
) -> Result<RunReport> {
    ensure_dir(&base.join(RUNTIME_DIR), "create runtime.d")?;

    let refs = job.plugin_refs(namespace)?;
    if refs.is_empty() {
        info!(namespace = %namespace, "no plugins configured");
    }

    let mut outcomes = Vec::with_capacity(refs.len());
    for (index, plugin_ref) in refs.iter().enumerate() {
        let name = plugin_ref.plugin.as_str();

        if !plugin_ref.applies_to(taskrole) {
            info!(plugin = %name, index, taskrole = %taskrole, "plugin not bound to task role, skipping");
            outcomes.push(PluginOutcome {
                index,
                plugin: name.to_string(),
                status: PluginStatus::Skipped,
                exit_code: None,
                emitted_pre: false,
                emitted_post: false,
            });
            continue;
        }

        let raw_params = plugin_ref
            .parameters
            .as_ref()
            .map(value_to_string)
            .unwrap_or_default();
        let parameters = resolve_references(&raw_params, job, taskrole)?;

        let descriptor = load_descriptor(base, name)?;

        let pre_path = plugin_script_path(base, "pre", index);
        let post_path = plugin_script_path(base, "post", index);

        let mut status = PluginStatus::Succeeded;
        let mut exit_code = None;

        if let Some(script) = descriptor.init_script_path(base, name) {
            info!(plugin = %name, index, script = %script.display(), "running plugin init script");
            let args = [
                parameters,
                pre_path.to_string_lossy().into_owned(),
                post_path.to_string_lossy().into_owned(),
            ];
            match run_streamed(&script, &args, name) {
                Ok(exit) => {
                    exit_code = exit.code();
                    if !exit.success() {
                        error!(
                            plugin = %name,
                            script = %script.display(),
                            code = exit.code().unwrap_or(-1),
                            "plugin init script failed"
                        );
                        status = PluginStatus::InitFailed;
                    }
                }
                Err(e) => {
                    error!(plugin = %name, script = %script.display(), "failed to run init script: {}", e);
                    status = PluginStatus::InitFailed;
                }
            }
        }

        // A plugin that failed mid-run may still have written its scripts;
        // whatever exists on disk is collected.
        let emitted_pre = pre_path.is_file();
        if emitted_pre {
            commands.push_pre(format!("/bin/bash {}", pre_path.display()));
        }
        let emitted_post = post_path.is_file();
        if emitted_post {
            commands.push_post(format!("/bin/bash {}", post_path.display()));
        }

        outcomes.push(PluginOutcome {
            index,
            plugin: name.to_string(),
            status,
            exit_code,
            emitted_pre,
            emitted_post,
        });
    }

    Ok(RunReport {
        task_role: taskrole.to_string(),
        plugins: outcomes,
        pre_commands: commands.pre().len(),
        post_commands: commands.post().len(),
    })
}
