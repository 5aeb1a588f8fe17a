//! Command implementations for the CLI interface.
//!
//! Each subcommand resolves its task arguments against the current project,
//! calls one `SchedulingService` operation and prints the result, either as a
//! table for people or as JSON for scripts.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};
use uuid::Uuid;

use project_schedule::db::{format_due_relative, parse_date_input, truncate};
use project_schedule::fields::*;
use project_schedule::hierarchy::{depth_first, level_map, TreeNode};
use project_schedule::service::DEFAULT_PAGE_SIZE;
use project_schedule::{
    BulkUpdate, Database, NewDeadline, NewDependency, NewTask, ParentFilter, RequestContext,
    SchedulingService, TaskId, TaskListParams, TaskPatch, TaskView,
};

type Service = SchedulingService<Database>;

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks with optional filtering, sorting and paging.
    List {
        /// Status filter: not_started | in_progress | complete | all.
        #[arg(long)]
        status: Option<String>,
        /// Only direct children of this task (ID or name).
        #[arg(long, conflicts_with = "roots")]
        parent: Option<String>,
        /// Only root tasks.
        #[arg(long)]
        roots: bool,
        /// Filter on the milestone flag: true | false.
        #[arg(long)]
        milestone: Option<bool>,
        /// Case-insensitive substring of the task name.
        #[arg(long)]
        search: Option<String>,
        /// Sort key: name | start_date | finish_date | percent_complete | status | created_at | sort_order.
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction.
        #[arg(long, value_enum, default_value_t = SortDirection::Asc)]
        order: SortDirection,
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page.
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
        /// Indent names by WBS level.
        #[arg(long)]
        tree: bool,
        /// Print the page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one task with its predecessors, deadline and subtree.
    View {
        /// Task ID, ID prefix or name.
        id: String,
        /// Print the task as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a new task.
    Add {
        /// Task name.
        name: String,
        /// Parent task ID or name.
        #[arg(long)]
        parent: Option<String>,
        /// Mark the task as a zero-duration milestone.
        #[arg(long)]
        milestone: bool,
        /// Explicit sort order; appended to its sibling group otherwise.
        #[arg(long)]
        sort_order: Option<i64>,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Update an existing task's fields.
    Update {
        /// Task ID, ID prefix or name.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New parent task ID or name.
        #[arg(long, conflicts_with = "clear_parent")]
        parent: Option<String>,
        /// Set or unset the milestone flag: true | false.
        #[arg(long)]
        milestone: Option<bool>,
        /// New sort order within the sibling group.
        #[arg(long)]
        sort_order: Option<i64>,
        #[command(flatten)]
        fields: TaskFields,
        /// Move the task to the root level.
        #[arg(long)]
        clear_parent: bool,
        /// Clear the start date.
        #[arg(long, conflicts_with = "start")]
        clear_start: bool,
        /// Clear the finish date.
        #[arg(long, conflicts_with = "finish")]
        clear_finish: bool,
        /// Clear the duration.
        #[arg(long, conflicts_with = "duration")]
        clear_duration: bool,
        /// Clear the constraint type and date.
        #[arg(long, conflicts_with_all = ["constraint", "constraint_date"])]
        clear_constraint: bool,
        /// Clear the WBS code.
        #[arg(long, conflicts_with = "wbs")]
        clear_wbs: bool,
    },

    /// Delete a task with its dependencies and deadline.
    Delete {
        /// Task ID, ID prefix or name.
        id: String,
    },

    /// Apply the same status or progress to several tasks.
    BulkUpdate {
        /// Task IDs, ID prefixes or names.
        #[arg(required = true)]
        ids: Vec<String>,
        /// New status.
        #[arg(long)]
        status: Option<String>,
        /// New percent complete (0-100).
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: Option<u8>,
    },

    /// Make a task the child of its preceding sibling.
    Indent {
        /// Task ID, ID prefix or name.
        id: String,
    },

    /// Move a task up to its grandparent's level.
    Outdent {
        /// Task ID, ID prefix or name.
        id: String,
    },

    /// Manage precedence dependencies.
    Dep {
        #[command(subcommand)]
        action: DepAction,
    },

    /// Manage task deadlines.
    Deadline {
        #[command(subcommand)]
        action: DeadlineAction,
    },

    /// Show project summary statistics.
    Summary {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print Gantt chart items as JSON.
    Gantt,

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Whether the command writes to the database.
    pub fn is_mutating(&self) -> bool {
        match self {
            Commands::Add { .. }
            | Commands::Update { .. }
            | Commands::Delete { .. }
            | Commands::BulkUpdate { .. }
            | Commands::Indent { .. }
            | Commands::Outdent { .. } => true,
            Commands::Dep { action } => !matches!(action, DepAction::List { .. }),
            Commands::Deadline { .. } => true,
            Commands::List { .. }
            | Commands::View { .. }
            | Commands::Summary { .. }
            | Commands::Gantt
            | Commands::Completions { .. } => false,
        }
    }
}

/// Scheduling fields shared by `add` and `update`.
#[derive(Args, Debug, Default)]
pub struct TaskFields {
    /// Start date: YYYY-MM-DD, "today", "tomorrow", "in 3d", "next fri".
    #[arg(long)]
    pub start: Option<String>,
    /// Finish date, same formats as --start.
    #[arg(long)]
    pub finish: Option<String>,
    /// Duration in days.
    #[arg(long)]
    pub duration: Option<u32>,
    /// Percent complete (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: Option<u8>,
    /// Status: not_started | in_progress | complete.
    #[arg(long)]
    pub status: Option<String>,
    /// Date constraint kind.
    #[arg(long, value_enum)]
    pub constraint: Option<ConstraintType>,
    /// Date the constraint applies to.
    #[arg(long)]
    pub constraint_date: Option<String>,
    /// WBS code, e.g. 1.2.3.
    #[arg(long)]
    pub wbs: Option<String>,
}

#[derive(Subcommand)]
pub enum DepAction {
    /// Make SUCCESSOR depend on PREDECESSOR.
    Add {
        /// Predecessor task ID or name.
        predecessor: String,
        /// Successor task ID or name.
        successor: String,
        /// Link type: fs | ss | ff | sf.
        #[arg(long = "type")]
        kind: Option<String>,
        /// Lag in days; negative for lead.
        #[arg(long, allow_hyphen_values = true)]
        lag: Option<i32>,
    },
    /// List the project's dependencies.
    List {
        /// Only dependencies of this successor task.
        #[arg(long)]
        task: Option<String>,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove a dependency by its ID or ID prefix.
    Rm {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DeadlineAction {
    /// Set or replace a task's deadline.
    Set {
        /// Task ID, ID prefix or name.
        id: String,
        /// Deadline date, same formats as --start.
        date: String,
    },
    /// Remove a task's deadline.
    Rm {
        /// Task ID, ID prefix or name.
        id: String,
    },
}

/// Run one parsed command against the service.
pub fn run(svc: &mut Service, ctx: &RequestContext, project: &str, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            status, parent, roots, milestone, search, sort, order, page, limit, tree, json,
        } => {
            let parent_filter = match parent {
                Some(p) => ParentFilter::Children(resolve_in_project(svc, project, &p)?),
                None if roots => ParentFilter::Root,
                None => ParentFilter::Any,
            };
            let params = TaskListParams {
                page,
                limit,
                sort,
                order,
                status: status.map(TaskStatus::from),
                parent_task_id: parent_filter,
                is_milestone: milestone,
                search,
            };
            cmd_list(svc, project, &params, tree, json)
        }
        Commands::View { id, json } => cmd_view(svc, project, &id, json),
        Commands::Add { name, parent, milestone, sort_order, fields } => {
            cmd_add(svc, ctx, project, name, parent, milestone, sort_order, fields)
        }
        Commands::Update {
            id, name, parent, milestone, sort_order, fields, clear_parent, clear_start,
            clear_finish, clear_duration, clear_constraint, clear_wbs,
        } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            let today = Local::now().date_naive();
            let mut patch = TaskPatch {
                name,
                sort_order,
                is_milestone: milestone,
                duration_days: fields.duration.map(Some),
                percent_complete: fields.percent,
                status: fields.status.map(TaskStatus::from),
                start_date: parse_opt_date(fields.start.as_deref(), today)?.map(Some),
                finish_date: parse_opt_date(fields.finish.as_deref(), today)?.map(Some),
                constraint_type: fields.constraint.map(Some),
                constraint_date: parse_opt_date(fields.constraint_date.as_deref(), today)?.map(Some),
                wbs_code: fields.wbs.map(Some),
                ..Default::default()
            };
            if let Some(p) = parent {
                patch.parent_task_id = Some(Some(resolve_in_project(svc, project, &p)?));
            }
            if clear_parent {
                patch.parent_task_id = Some(None);
            }
            if clear_start {
                patch.start_date = Some(None);
            }
            if clear_finish {
                patch.finish_date = Some(None);
            }
            if clear_duration {
                patch.duration_days = Some(None);
            }
            if clear_constraint {
                patch.constraint_type = Some(None);
                patch.constraint_date = Some(None);
            }
            if clear_wbs {
                patch.wbs_code = Some(None);
            }
            if patch.is_empty() {
                bail!("nothing to update");
            }
            let updated = svc.update_task(ctx, project, task_id, patch)?;
            println!("Updated task {}", updated.id());
            Ok(())
        }
        Commands::Delete { id } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            if svc.delete_task(ctx, project, task_id)? {
                println!("Deleted task {task_id}");
            } else {
                println!("Task {task_id} was already gone");
            }
            Ok(())
        }
        Commands::BulkUpdate { ids, status, percent } => {
            let tasks = svc.tasks(project)?;
            let ids = ids
                .iter()
                .map(|s| Uuid::parse_str(s).or_else(|_| resolve_task_identifier(s, &tasks)))
                .collect::<Result<Vec<_>>>()?;
            let bulk = BulkUpdate {
                ids,
                updates: TaskPatch {
                    status: status.map(TaskStatus::from),
                    percent_complete: percent,
                    ..Default::default()
                },
            };
            if bulk.updates.is_empty() {
                bail!("nothing to update: pass --status or --percent");
            }
            let result = svc.bulk_update_tasks(ctx, project, &bulk)?;
            println!("Updated {} task(s)", result.success.len());
            for failure in &result.failed {
                eprintln!("  {}: {}", failure.id, failure.error);
            }
            Ok(())
        }
        Commands::Indent { id } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            let moved = svc.indent(ctx, project, task_id)?;
            println!("Indented '{}' under {}", moved.task.name, describe_parent(svc, project, moved.task.parent_task_id));
            Ok(())
        }
        Commands::Outdent { id } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            let moved = svc.outdent(ctx, project, task_id)?;
            println!("Outdented '{}' to {}", moved.task.name, describe_parent(svc, project, moved.task.parent_task_id));
            Ok(())
        }
        Commands::Dep { action } => cmd_dep(svc, ctx, project, action),
        Commands::Deadline { action } => cmd_deadline(svc, ctx, project, action),
        Commands::Summary { json } => cmd_summary(svc, project, json),
        Commands::Gantt => {
            let items = svc.gantt_data(project)?;
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Add a new task to the project.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    svc: &mut Service,
    ctx: &RequestContext,
    project: &str,
    name: String,
    parent: Option<String>,
    milestone: bool,
    sort_order: Option<i64>,
    fields: TaskFields,
) -> Result<()> {
    let today = Local::now().date_naive();
    let parent_task_id = parent
        .map(|p| resolve_in_project(svc, project, &p))
        .transpose()?;
    let new = NewTask {
        name,
        parent_task_id,
        start_date: parse_opt_date(fields.start.as_deref(), today)?,
        finish_date: parse_opt_date(fields.finish.as_deref(), today)?,
        duration_days: fields.duration,
        percent_complete: fields.percent,
        status: fields.status.map(TaskStatus::from),
        is_milestone: Some(milestone),
        constraint_type: fields.constraint,
        constraint_date: parse_opt_date(fields.constraint_date.as_deref(), today)?,
        wbs_code: fields.wbs,
        sort_order,
    };
    let created = svc.create_task(ctx, project, new)?;
    println!("Added task {}", created.id());
    Ok(())
}

/// List one page of tasks.
pub fn cmd_list(
    svc: &Service,
    project: &str,
    params: &TaskListParams,
    tree: bool,
    json: bool,
) -> Result<()> {
    let page = svc.list_tasks(project, params)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let levels = if tree {
        Some(level_map(&svc.hierarchy(project)?))
    } else {
        None
    };
    let rows: Vec<(&TaskView, usize)> = page
        .rows
        .iter()
        .map(|t| {
            let level = levels.as_ref().and_then(|m| m.get(&t.id()).copied()).unwrap_or(0);
            (t, level)
        })
        .collect();
    print_table(&rows);

    let p = page.pagination;
    println!(
        "Page {}/{} ({} task(s))",
        p.current_page,
        p.total_pages.max(1),
        p.total_records
    );
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view(svc: &Service, project: &str, id: &str, json: bool) -> Result<()> {
    let task_id = resolve_in_project(svc, project, id)?;
    let view = svc.get_task(project, task_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let tasks = svc.tasks(project)?;
    let name_of = |id: TaskId| {
        tasks
            .iter()
            .find(|t| t.id() == id)
            .map_or_else(|| id.to_string(), |t| t.task.name.clone())
    };
    let today = Local::now().date_naive();
    let t = &view.task;
    println!("ID:           {}", t.id);
    println!("Name:         {}", t.name);
    println!("Status:       {}", t.status);
    println!("Progress:     {}%", t.percent_complete);
    println!("Milestone:    {}", if t.is_milestone { "yes" } else { "no" });
    println!("WBS:          {}", t.wbs_code.as_deref().unwrap_or("-"));
    println!("Parent:       {}", t.parent_task_id.map_or_else(|| "-".into(), name_of));
    println!("Start:        {}", format_date(t.start_date));
    println!("Finish:       {}", format_date(t.finish_date));
    println!("Duration:     {}", t.duration_days.map_or_else(|| "-".into(), |d| format!("{d}d")));
    println!(
        "Constraint:   {}",
        match (t.constraint_type, t.constraint_date) {
            (Some(kind), Some(date)) => format!("{kind:?} {date}"),
            _ => "-".into(),
        }
    );
    println!(
        "Deadline:     {}",
        match view.deadline_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Overdue:      {}", if view.is_overdue { "yes" } else { "no" });
    println!("Created by:   {}", t.created_by.as_deref().unwrap_or("-"));
    println!("Created UTC:  {}", format_timestamp(t.created_at_utc));
    println!("Updated UTC:  {}", format_timestamp(t.updated_at_utc));

    println!("Predecessors:");
    if view.predecessors.is_empty() {
        println!("  -");
    }
    for dep in &view.predecessors {
        println!(
            "  {} {} lag {}d (#{})",
            dep.dependency_type.short(),
            name_of(dep.predecessor_task_id),
            dep.lag_days,
            short_id(dep.id)
        );
    }

    println!("Children:");
    let forest = svc.hierarchy(project)?;
    match find_node(&forest, task_id) {
        Some(node) if !node.children.is_empty() => {
            for (child, level) in depth_first(&node.children) {
                println!(
                    "{}- {} [{}] (#{})",
                    "  ".repeat(level - node.level),
                    child.task.name,
                    child.task.status,
                    short_id(child.id())
                );
            }
        }
        _ => println!("  -"),
    }
    Ok(())
}

fn cmd_dep(svc: &mut Service, ctx: &RequestContext, project: &str, action: DepAction) -> Result<()> {
    match action {
        DepAction::Add { predecessor, successor, kind, lag } => {
            let new = NewDependency {
                predecessor_task_id: resolve_in_project(svc, project, &predecessor)?,
                task_id: resolve_in_project(svc, project, &successor)?,
                dependency_type: kind.map(DependencyType::from),
                lag_days: lag,
            };
            let dep = svc.create_dependency(ctx, new)?;
            println!("Added dependency {} ({})", dep.id, dep.dependency_type.short());
        }
        DepAction::List { task, json } => {
            let mut deps = svc.list_dependencies(project)?;
            if let Some(task) = task {
                let task_id = resolve_in_project(svc, project, &task)?;
                deps.retain(|d| d.task_id == task_id);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&deps)?);
                return Ok(());
            }
            let tasks = svc.tasks(project)?;
            let name_of = |id: TaskId| {
                tasks
                    .iter()
                    .find(|t| t.id() == id)
                    .map_or_else(|| short_id(id), |t| truncate(&t.task.name, 24))
            };
            println!("{:<9} {:<24} {:<4} {:>5} {}", "ID", "Predecessor", "Type", "Lag", "Successor");
            for d in &deps {
                println!(
                    "{:<9} {:<24} {:<4} {:>5} {}",
                    short_id(d.id),
                    name_of(d.predecessor_task_id),
                    d.dependency_type.short(),
                    d.lag_days,
                    name_of(d.task_id)
                );
            }
        }
        DepAction::Rm { id } => {
            let deps = svc.list_dependencies(project)?;
            let dep_id = resolve_by_prefix(&id, deps.iter().map(|d| d.id))
                .with_context(|| format!("resolving dependency '{id}'"))?;
            if svc.delete_dependency(ctx, dep_id)? {
                println!("Removed dependency {dep_id}");
            } else {
                println!("Dependency {dep_id} was already gone");
            }
        }
    }
    Ok(())
}

fn cmd_deadline(
    svc: &mut Service,
    ctx: &RequestContext,
    project: &str,
    action: DeadlineAction,
) -> Result<()> {
    match action {
        DeadlineAction::Set { id, date } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            let deadline_date = parse_date(&date, Local::now().date_naive())?;
            let deadline = svc.set_deadline(ctx, NewDeadline { task_id, deadline_date })?;
            println!("Deadline for {} set to {}", task_id, deadline.deadline_date);
        }
        DeadlineAction::Rm { id } => {
            let task_id = resolve_in_project(svc, project, &id)?;
            if svc.remove_deadline(ctx, task_id)? {
                println!("Deadline for {task_id} removed");
            } else {
                println!("Task {task_id} had no deadline");
            }
        }
    }
    Ok(())
}

fn cmd_summary(svc: &Service, project: &str, json: bool) -> Result<()> {
    let s = svc.summary(project)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }
    println!("Project:      {project}");
    println!("Tasks:        {}", s.total_tasks);
    println!("Complete:     {}", s.completed_tasks);
    println!("In progress:  {}", s.in_progress_tasks);
    println!("Not started:  {}", s.not_started_tasks);
    println!("Milestones:   {}", s.milestones_count);
    println!("Overdue:      {}", s.overdue_tasks);
    println!("Progress:     {}%", s.overall_percent_complete);
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print tasks as a table, indenting names by the paired level.
pub fn print_table(rows: &[(&TaskView, usize)]) {
    println!(
        "{:<9} {:<12} {:>4} {:<11} {:<11} {:<10} {}",
        "ID", "Status", "%", "Start", "Finish", "Deadline", "Name"
    );
    let today = Local::now().date_naive();
    for (t, level) in rows {
        let marker = if t.task.is_milestone { "◆ " } else { "" };
        let late = if t.is_overdue { " (overdue)" } else { "" };
        println!(
            "{:<9} {:<12} {:>4} {:<11} {:<11} {:<10} {}{}{}{}",
            short_id(t.id()),
            truncate(t.task.status.as_str(), 12),
            t.task.percent_complete,
            format_date(t.task.start_date),
            format_date(t.task.finish_date),
            format_due_relative(t.deadline_date, today),
            "  ".repeat(*level),
            marker,
            t.task.name,
            late
        );
    }
}

/// Resolve a task identifier (full ID, unique ID prefix or name) among `tasks`.
pub fn resolve_task_identifier(identifier: &str, tasks: &[TaskView]) -> Result<TaskId> {
    let identifier = identifier.trim();
    if let Ok(id) = Uuid::parse_str(identifier) {
        return if tasks.iter().any(|t| t.id() == id) {
            Ok(id)
        } else {
            Err(anyhow!("Task with ID {id} not found"))
        };
    }

    // Search by name (case-insensitive)
    let wanted = identifier.to_lowercase();
    let matches: Vec<&TaskView> = tasks
        .iter()
        .filter(|t| t.task.name.to_lowercase() == wanted)
        .collect();
    match matches.len() {
        1 => return Ok(matches[0].id()),
        0 => {}
        _ => {
            let mut error_msg = format!("Multiple tasks found with name '{identifier}':\n");
            for t in matches {
                error_msg.push_str(&format!("  ID {}: {}", t.id(), t.task.name));
                if let Some(wbs) = &t.task.wbs_code {
                    error_msg.push_str(&format!(" [wbs: {wbs}]"));
                }
                error_msg.push('\n');
            }
            error_msg.push_str("Please use the specific ID instead.");
            bail!(error_msg);
        }
    }

    resolve_by_prefix(identifier, tasks.iter().map(TaskView::id))
        .map_err(|_| anyhow!("No task found with name or ID '{identifier}'"))
}

fn resolve_in_project(svc: &Service, project: &str, identifier: &str) -> Result<TaskId> {
    let tasks = svc.tasks(project)?;
    resolve_task_identifier(identifier, &tasks)
}

/// Match a hex ID prefix (at least four characters) against candidate IDs.
fn resolve_by_prefix(prefix: &str, ids: impl Iterator<Item = Uuid>) -> Result<Uuid> {
    let prefix = prefix.to_lowercase();
    if prefix.len() < 4 || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!("'{prefix}' is not an ID prefix");
    }
    let hits: Vec<Uuid> = ids.filter(|id| id.to_string().starts_with(&prefix)).collect();
    match hits.as_slice() {
        [one] => Ok(*one),
        [] => bail!("No ID starts with '{prefix}'"),
        _ => bail!("ID prefix '{prefix}' is ambiguous ({} matches)", hits.len()),
    }
}

fn find_node(nodes: &[TreeNode], id: TaskId) -> Option<&TreeNode> {
    nodes.iter().find_map(|n| {
        if n.task.id() == id {
            Some(n)
        } else {
            find_node(&n.children, id)
        }
    })
}

fn describe_parent(svc: &Service, project: &str, parent: Option<TaskId>) -> String {
    match parent {
        None => "the root level".into(),
        Some(id) => svc
            .get_task(project, id)
            .map_or_else(|_| id.to_string(), |p| format!("'{}'", p.task.name)),
    }
}

fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    parse_date_input(s, today).ok_or_else(|| {
        anyhow!("Invalid date '{s}'. Use YYYY-MM-DD, today, tomorrow, 'in 3d', 'next fri' or eow")
    })
}

fn parse_opt_date(s: Option<&str>, today: NaiveDate) -> Result<Option<NaiveDate>> {
    s.map(|s| parse_date(s, today)).transpose()
}

fn format_date(d: Option<NaiveDate>) -> String {
    d.map_or_else(|| "-".into(), |d| d.to_string())
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map_or_else(|| "-".into(), |t| t.to_rfc3339())
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
