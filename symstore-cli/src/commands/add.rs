//! `symstore add` - publish a file into a structured store.

use std::path::PathBuf;

use clap::Args;
use symstore::store::StructuredSymbolStore;
use symstore::{BuildId, FileReference, SymbolStore};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// File to add
    pub source: PathBuf,

    /// Root of the structured store
    #[arg(long)]
    pub store: PathBuf,

    /// Name to store the file under (defaults to the source file name)
    #[arg(long)]
    pub filename: Option<String>,

    /// Build id of the file in hex
    #[arg(long)]
    pub build_id: String,
}

/// Copy the source into the store and print the new location.
pub async fn run(args: AddArgs) -> Result<(), CliError> {
    let build_id = BuildId::parse(&args.build_id)?;
    let filename = match args.filename {
        Some(name) => name,
        None => args
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "'{}' has no file name; use --filename",
                    args.source.display()
                ))
            })?,
    };

    let store = SymbolStore::from(StructuredSymbolStore::new(args.store, false)?);
    let added = store
        .add_file(&FileReference::local(args.source), &filename, &build_id)
        .await?;

    println!("{}", added.location());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_uses_source_name() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("libfoo.so");
        std::fs::write(&source, b"elf").unwrap();
        let store = temp.path().join("store");

        run(AddArgs {
            source,
            store: store.clone(),
            filename: None,
            build_id: "ab12".to_string(),
        })
        .await
        .unwrap();

        assert!(store.join("libfoo.so/AB12/libfoo.so").is_file());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_build_id() {
        let temp = TempDir::new().unwrap();
        let err = run(AddArgs {
            source: temp.path().join("x"),
            store: temp.path().join("store"),
            filename: None,
            build_id: "xyz".to_string(),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::BuildId(_)));
    }
}
