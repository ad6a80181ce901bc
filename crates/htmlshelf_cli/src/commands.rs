//! Command handlers. Each one runs against a hydrated store.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use htmlshelf_core::view::sorted_by_name;
use htmlshelf_core::{
    FileRecord, FilesStore, IngestError, LocalFile, NoticeKind, SortOrder, UploadSource,
};

use crate::cli::{AsideArg, Command, SortArg};

pub async fn run(store: &mut FilesStore, command: Command) -> Result<()> {
    match command {
        Command::Add { paths } => run_add(store, paths).await,
        Command::List { sort } => {
            run_list(store, sort.map(sort_order));
            Ok(())
        }
        Command::Show { id } => run_show(store, id.as_deref()),
        Command::Select { id, none } => {
            if none {
                store.select_file(None);
                println!("selection cleared");
                return Ok(());
            }
            let id = id.ok_or_else(|| anyhow!("an id or --none is required"))?;
            if store.state().find(&id).is_none() {
                bail!("no file with id `{id}`");
            }
            store.select_file(Some(&id));
            println!("selected {id}");
            Ok(())
        }
        Command::Remove { id } => {
            let removed = store
                .remove_file(&id)
                .ok_or_else(|| anyhow!("no file with id `{id}`"))?;
            println!("removed {} ({})", removed.name, removed.id);
            Ok(())
        }
        Command::Toggle { id } => {
            let completed = store
                .toggle_file_completed(&id)
                .ok_or_else(|| anyhow!("no file with id `{id}`"))?;
            println!(
                "{id} marked {}",
                if completed { "completed" } else { "not completed" }
            );
            Ok(())
        }
        Command::Sort { order } => {
            store.sort_files_by_name(sort_order(order));
            run_list(store, None);
            Ok(())
        }
        Command::Clear => {
            let count = store.files().len();
            store.clear_all_files();
            println!("removed {count} file(s)");
            Ok(())
        }
        Command::Aside { action } => {
            match action {
                Some(AsideArg::On) => store.set_hide_aside(true),
                Some(AsideArg::Off) => store.set_hide_aside(false),
                Some(AsideArg::Toggle) => store.toggle_hide_aside(),
                None => {}
            }
            println!("hide_aside={}", store.hide_aside());
            Ok(())
        }
        Command::Stats => {
            println!("files={}", store.files().len());
            println!("completed={}", store.completed_count());
            println!("progress={:.1}%", store.progress_percentage());
            Ok(())
        }
    }
}

async fn run_add(store: &mut FilesStore, paths: Vec<PathBuf>) -> Result<()> {
    let mut sources: Vec<Box<dyn UploadSource>> = Vec::with_capacity(paths.len());
    for path in paths {
        match LocalFile::new(&path) {
            Ok(file) => sources.push(Box::new(file)),
            Err(source) => {
                let err = IngestError::Unreadable {
                    name: path.display().to_string(),
                    source,
                };
                eprintln!("Upload Error: {err}");
            }
        }
    }

    let report = store.ingest(&sources).await;
    for notice in report.notices() {
        match notice.kind {
            NoticeKind::Error => eprintln!("{}: {}", notice.title, notice.description),
            NoticeKind::Success => println!("{}: {}", notice.title, notice.description),
        }
    }
    for id in &report.added {
        println!("  {id}");
    }
    Ok(())
}

fn run_list(store: &FilesStore, order: Option<SortOrder>) {
    if store.files().is_empty() {
        println!("no files");
        return;
    }

    let selected = store.selected_file_id();
    let print = |file: &FileRecord| {
        let marker = if selected == Some(file.id.as_str()) { '*' } else { ' ' };
        let done = if file.completed { 'x' } else { ' ' };
        println!(
            "{marker} [{done}] {}  {}  {} bytes  {}",
            file.id,
            file.name,
            file.size,
            file.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    };

    match order {
        Some(order) => sorted_by_name(store.files(), order).into_iter().for_each(print),
        None => store.files().iter().for_each(print),
    }
}

fn run_show(store: &FilesStore, id: Option<&str>) -> Result<()> {
    let file = match id {
        Some(id) => store
            .state()
            .find(id)
            .ok_or_else(|| anyhow!("no file with id `{id}`"))?,
        None => store
            .selected_file()
            .ok_or_else(|| anyhow!("no file selected"))?,
    };
    println!("{}", file.content);
    Ok(())
}

fn sort_order(arg: SortArg) -> SortOrder {
    match arg {
        SortArg::Asc => SortOrder::Ascending,
        SortArg::Desc => SortOrder::Descending,
    }
}
