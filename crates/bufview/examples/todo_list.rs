//! Todo list example
//!
//! Mounts a small todo app into the middle of an in-memory document and drives it with key
//! presses, printing the document and the edits each step produced.

use bufview::{App, Dispatch, MountPoint, Position, Program, RopeDocument, Thunk, ViewNode, view};
use futures::executor::LocalPool;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Msg {
    Toggle(usize),
    Remove(usize),
    Add(String),
}

struct Todo {
    label: String,
    done: bool,
}

struct TodoList;

impl Program for TodoList {
    type Model = Vec<Todo>;
    type Msg = Msg;

    fn init(&self) -> Vec<Todo> {
        ["write the parser", "wire up bindings", "ship it"]
            .into_iter()
            .map(|label| Todo {
                label: label.to_string(),
                done: false,
            })
            .collect()
    }

    fn update(&self, msg: Msg, todos: &mut Vec<Todo>) -> anyhow::Result<Option<Thunk<Msg>>> {
        match msg {
            Msg::Toggle(i) => {
                if let Some(todo) = todos.get_mut(i) {
                    todo.done = !todo.done;
                }
            }
            Msg::Remove(i) if i < todos.len() => {
                todos.remove(i);
            }
            Msg::Remove(i) => anyhow::bail!("no todo at index {i}"),
            Msg::Add(label) => todos.push(Todo { label, done: false }),
        }
        Ok(None)
    }

    fn view(&self, todos: &Vec<Todo>, dispatch: &Dispatch<Msg>) -> ViewNode {
        let rows = todos
            .iter()
            .enumerate()
            .map(|(i, todo)| {
                let mark = if todo.done { "x" } else { " " };
                let label = ViewNode::text(todo.label.as_str());
                let label = if todo.done { label.decorate("Comment") } else { label };
                view!("[{}] {}\n", mark, label)
                    .bind("<CR>", dispatch.handler(Msg::Toggle(i)))
                    .bind("dd", dispatch.handler(Msg::Remove(i)))
            })
            .collect::<Vec<_>>();
        let open = todos.iter().filter(|todo| !todo.done).count();
        view!("Todo ({} open)\n{}", open, rows)
    }
}

fn show(step: &str, doc: &RefCell<RopeDocument>) {
    let mut doc = doc.borrow_mut();
    println!("== {step} ==");
    for (row, line) in doc.lines().iter().enumerate() {
        println!("{row:>3} | {line}");
    }
    for edit in doc.take_edits() {
        println!("    edit {} <- {:?}", edit.range, edit.text());
    }
    println!();
}

fn main() {
    let mut pool = LocalPool::new();
    let doc = Rc::new(RefCell::new(RopeDocument::new("# Notes\n\n# Footer")));

    let app = App::new(TodoList)
        .mount(
            Rc::clone(&doc),
            MountPoint::point(Position::new(1, 0)),
            pool.spawner(),
        )
        .unwrap();
    show("mounted", &doc);

    doc.borrow_mut().set_cursor(Position::new(3, 4)).unwrap();
    app.on_key("<CR>");
    pool.run_until_stalled();
    show("toggled the second item", &doc);

    doc.borrow_mut().set_cursor(Position::new(2, 0)).unwrap();
    app.on_key("dd");
    pool.run_until_stalled();
    show("removed the first item", &doc);

    app.dispatch(Msg::Add("write the docs".to_string()));
    pool.run_until_stalled();
    show("added an item", &doc);

    app.dispatch(Msg::Remove(10));
    pool.run_until_stalled();
    show("removed a missing item", &doc);
    println!("status: {:?}", app.status());

    app.unmount().unwrap();
}
