//! Chunk snapshot files on disk.
#![forbid(unsafe_code)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tessera_chunk::{ChunkPersistence, ChunkSnapshot, PersistError};
use tessera_world::ChunkCoord;

/// One `bincode` file per chunk under a save directory.
pub struct DirPersistence {
    root: PathBuf,
}

impl DirPersistence {
    /// Opens (creating if needed) a save directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, PersistError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        log::info!("chunk saves under {}", root.display());
        Ok(Self { root })
    }

    pub fn path_for(&self, coord: ChunkCoord) -> PathBuf {
        self.root.join(format!("c.{}.{}.chunk", coord.cx, coord.cz))
    }

    /// Coordinates with a file on disk, sorted.
    pub fn stored_coords(&self) -> Result<Vec<ChunkCoord>, PersistError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            if let Some(c) = name.to_str().and_then(parse_file_name) {
                out.push(c);
            }
        }
        out.sort();
        Ok(out)
    }
}

fn parse_file_name(name: &str) -> Option<ChunkCoord> {
    let rest = name.strip_prefix("c.")?.strip_suffix(".chunk")?;
    let (cx, cz) = rest.split_once('.')?;
    Some(ChunkCoord::new(cx.parse().ok()?, cz.parse().ok()?))
}

impl ChunkPersistence for DirPersistence {
    fn load(&self, coord: ChunkCoord) -> Result<Option<ChunkSnapshot>, PersistError> {
        let path = self.path_for(coord);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snap: ChunkSnapshot =
            bincode::deserialize(&bytes).map_err(|e| PersistError::Codec(e.to_string()))?;
        if snap.coord != coord {
            return Err(PersistError::Invalid(format!(
                "{} holds chunk {}, expected {coord}",
                path.display(),
                snap.coord
            )));
        }
        log::trace!("loaded {}", path.display());
        Ok(Some(snap))
    }

    fn save(&self, snapshot: &ChunkSnapshot) -> Result<(), PersistError> {
        let bytes = bincode::serialize(snapshot).map_err(|e| PersistError::Codec(e.to_string()))?;
        let path = self.path_for(snapshot.coord);
        let tmp = path.with_extension("chunk.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        log::trace!("saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        assert_eq!(parse_file_name("c.-3.12.chunk"), Some(ChunkCoord::new(-3, 12)));
        assert_eq!(parse_file_name("c.1.chunk"), None);
        assert_eq!(parse_file_name("c.1.2.chunk.tmp"), None);
        assert_eq!(parse_file_name("notes.txt"), None);
    }
}
