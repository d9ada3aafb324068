//! Command aggregation and persistence.
//!
//! Two ordered lists accumulate the shell commands run around the task
//! workload. `pre` grows at the tail in plugin declaration order; each new
//! `post` entry is inserted at the head, so post commands unwind in reverse:
//! the first plugin's post action runs last.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::jobconfig::JobConfig;
use crate::utils::io::{append_file, ensure_dir};

pub const PRE_COMMANDS_FILE: &str = "precommands.sh";
pub const POST_COMMANDS_FILE: &str = "postcommands.sh";
pub const RUNTIME_DIR: &str = "runtime.d";

#[derive(Debug, Default)]
pub struct CommandSet {
    pre: Vec<String>,
    post: Vec<String>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail of the pre-command list.
    pub fn push_pre(&mut self, command: String) {
        self.pre.push(command);
    }

    /// Insert at the head of the post-command list.
    pub fn push_post(&mut self, command: String) {
        self.post.insert(0, command);
    }

    pub fn pre(&self) -> &[String] {
        &self.pre
    }

    pub fn post(&self) -> &[String] {
        &self.post
    }

    /// Append both lists to the persisted command scripts under
    /// `<base>/runtime.d/`, creating the directory and files if absent.
    /// Existing content is preserved; appended content ends with a newline
    /// so later appends never glue onto the last command.
    pub fn persist(&self, base: &Path) -> Result<()> {
        let runtime_dir = base.join(RUNTIME_DIR);
        ensure_dir(&runtime_dir, "create runtime.d")?;

        write_joined(&runtime_dir.join(PRE_COMMANDS_FILE), &self.pre)?;
        write_joined(&runtime_dir.join(POST_COMMANDS_FILE), &self.post)?;
        Ok(())
    }
}

fn write_joined(path: &Path, commands: &[String]) -> Result<()> {
    if commands.is_empty() {
        // Still create the file; the entrypoint sources it unconditionally.
        return append_file(path, "", "write command script");
    }
    append_file(path, &format!("{}\n", commands.join("\n")), "write command script")
}

/// Inject the selected deployment's declared command blocks.
///
/// Off the default execution path; callable when downstream configuration
/// re-enables it. Each deployment matching `defaults.deployment` and
/// containing the task role contributes its `preCommands` (joined, appended
/// at the tail) and `postCommands` (joined, inserted at the head). Missing
/// sections are not an error.
pub fn inject_deployment(job: &JobConfig, commands: &mut CommandSet, taskrole: &str) {
    let Some(name) = job
        .defaults
        .as_ref()
        .and_then(|d| d.deployment.as_deref())
    else {
        info!("no deployment selected in jobconfig, skipping injection");
        return;
    };

    for deployment in job.deployments.iter().filter(|d| d.name == name) {
        let Some(role_commands) = deployment.task_roles.get(taskrole) else {
            continue;
        };
        if let Some(pre) = &role_commands.pre_commands {
            commands.push_pre(pre.join("\n"));
        }
        if let Some(post) = &role_commands.post_commands {
            commands.push_post(post.join("\n"));
        }
        info!(deployment = %name, taskrole = %taskrole, "injected deployment commands");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn pre_appends_post_head_inserts() {
        let mut commands = CommandSet::new();
        commands.push_pre("p0".into());
        commands.push_post("q0".into());
        commands.push_pre("p1".into());
        commands.push_post("q1".into());

        assert_eq!(commands.pre(), ["p0", "p1"]);
        assert_eq!(commands.post(), ["q1", "q0"]);
    }

    #[test]
    fn persist_appends_and_creates() {
        let base = TempDir::new().unwrap();
        let mut commands = CommandSet::new();
        commands.push_pre("echo one".into());
        commands.push_pre("echo two".into());
        commands.persist(base.path()).unwrap();

        let pre_path = base.path().join(RUNTIME_DIR).join(PRE_COMMANDS_FILE);
        assert_eq!(fs::read_to_string(&pre_path).unwrap(), "echo one\necho two\n");
        // post list was empty but the file still exists
        assert!(base
            .path()
            .join(RUNTIME_DIR)
            .join(POST_COMMANDS_FILE)
            .exists());

        // second persist appends, never truncates
        let mut more = CommandSet::new();
        more.push_pre("echo three".into());
        more.persist(base.path()).unwrap();
        assert_eq!(
            fs::read_to_string(&pre_path).unwrap(),
            "echo one\necho two\necho three\n"
        );
    }

    fn deployment_job() -> JobConfig {
        JobConfig::parse(
            r#"
defaults:
  deployment: prod
deployments:
  - name: staging
    taskRoles:
      worker:
        preCommands: ["echo staging"]
  - name: prod
    taskRoles:
      worker:
        preCommands: ["mount -a", "echo ready"]
        postCommands: ["umount /data"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn injects_matching_deployment_commands() {
        let job = deployment_job();
        let mut commands = CommandSet::new();
        commands.push_pre("plugin-pre".into());
        commands.push_post("plugin-post".into());

        inject_deployment(&job, &mut commands, "worker");

        assert_eq!(commands.pre(), ["plugin-pre", "mount -a\necho ready"]);
        assert_eq!(commands.post(), ["umount /data", "plugin-post"]);
    }

    #[test]
    fn skips_when_no_deployment_selected() {
        let job = JobConfig::parse("deployments: []").unwrap();
        let mut commands = CommandSet::new();
        inject_deployment(&job, &mut commands, "worker");
        assert!(commands.pre().is_empty());
        assert!(commands.post().is_empty());
    }

    #[test]
    fn skips_taskrole_not_in_deployment() {
        let job = deployment_job();
        let mut commands = CommandSet::new();
        inject_deployment(&job, &mut commands, "master");
        assert!(commands.pre().is_empty());
        assert!(commands.post().is_empty());
    }
}
