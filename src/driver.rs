use crate::backend::{self, Allocated};
use crate::error::{Error, Result};
use crate::frontend::parser;
use crate::ir::lower::{lower, LoweredBlock};
use crate::ir::RegisterView;
use std::fs;
use std::path::Path;

pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses ILOC text into a symbolic block.
pub fn parse_block(source_code: &str) -> Result<LoweredBlock> {
    let lines = parser::parse(source_code).map_err(Error::Syntax)?;
    Ok(lower(&lines))
}

/// Parses and renames, returning the block as text over virtual registers.
pub fn rename_source(source_code: &str) -> Result<String> {
    let renamed = backend::rename(parse_block(source_code)?)?;
    log::info!("renamed into {} virtual register(s)", renamed.virtual_count);

    Ok(backend::generator::render(&renamed.block, RegisterView::Virtual)?)
}

pub fn allocate_block(source_code: &str, registers: usize) -> Result<Allocated> {
    let allocated = backend::compile(parse_block(source_code)?, registers)?;
    log::info!(
        "allocated {} virtual register(s) onto {}: {} spill(s), {} restore(s)",
        allocated.virtual_count,
        registers,
        allocated.stats.spills,
        allocated.stats.restores
    );

    Ok(allocated)
}

/// Runs the whole pipeline and returns the block as text over `registers`
/// physical registers.
pub fn allocate_source(source_code: &str, registers: usize) -> Result<String> {
    let allocated = allocate_block(source_code, registers)?;
    Ok(backend::generator::render(&allocated.block, RegisterView::Physical)?)
}
