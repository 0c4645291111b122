use crate::support::print_json_or_exit;
use featcheck_kernel::all_tasks;
use serde_json::json;

pub fn run(json_output: bool) {
    let tasks = all_tasks();
    if json_output {
        let listed: Vec<_> = tasks
            .iter()
            .map(|task| json!({ "id": task.id(), "name": task.name() }))
            .collect();
        print_json_or_exit(&listed, "task list");
        return;
    }
    for task in &tasks {
        println!("{:<28}{}", task.id(), task.name());
    }
}
