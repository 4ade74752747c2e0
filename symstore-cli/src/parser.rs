//! Module parsing backed by the `object` crate.

use std::fs;
use std::path::Path;

use object::{BinaryFormat, Object};
use symstore::{BuildId, ModuleFormat, ModuleParseError, ModuleParser};

const DEBUG_INFO_SECTION: &str = ".debug_info";

/// Reads GNU build ids from ELF images and separate debug files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectModuleParser;

impl ObjectModuleParser {
    fn with_object<T>(
        path: &Path,
        format: ModuleFormat,
        f: impl FnOnce(&object::File<'_>) -> Result<T, ModuleParseError>,
    ) -> Result<T, ModuleParseError> {
        let display = path.display().to_string();
        if format != ModuleFormat::Elf {
            return Err(ModuleParseError::InvalidFile {
                path: display,
                reason: format!("{} modules are not supported", format),
            });
        }

        let data = fs::read(path).map_err(|e| ModuleParseError::ReadFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let file = object::File::parse(&*data).map_err(|e| ModuleParseError::InvalidFile {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        if file.format() != BinaryFormat::Elf {
            return Err(ModuleParseError::InvalidFile {
                path: display,
                reason: format!("expected an ELF file, found {:?}", file.format()),
            });
        }
        f(&file)
    }
}

impl ModuleParser for ObjectModuleParser {
    fn read_build_id(
        &self,
        path: &Path,
        _is_debug_info_file: bool,
        format: ModuleFormat,
    ) -> Result<BuildId, ModuleParseError> {
        Self::with_object(path, format, |file| {
            let display = path.display().to_string();
            match file.build_id() {
                Ok(Some(bytes)) if !bytes.is_empty() => Ok(BuildId::from_bytes(bytes)),
                Ok(_) => Err(ModuleParseError::MissingBuildId(display)),
                Err(e) => Err(ModuleParseError::InvalidFile {
                    path: display,
                    reason: e.to_string(),
                }),
            }
        })
    }

    fn verify_symbol_file(
        &self,
        path: &Path,
        is_debug_info_file: bool,
        format: ModuleFormat,
    ) -> Result<(), ModuleParseError> {
        Self::with_object(path, format, |file| {
            if is_debug_info_file && file.section_by_name(DEBUG_INFO_SECTION).is_none() {
                return Err(ModuleParseError::InvalidFile {
                    path: path.display().to_string(),
                    reason: format!("missing {} section", DEBUG_INFO_SECTION),
                });
            }
            Ok(())
        })
    }
}
