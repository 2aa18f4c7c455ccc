// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Read;
use std::path::Path;

use anchor_node::errors::AnchorError;

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<Vec<u8>, AnchorError> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| AnchorError::InvalidInput(format!("stdin: {}", e)))?;
        return Ok(buf);
    }
    std::fs::read(path).map_err(|e| AnchorError::InvalidInput(format!("{}: {}", path.display(), e)))
}
