//! Walking a tree as a caller-defined directory type.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use dual_tier::{DualDirectory, TypedDirectory};

#[derive(Debug, Clone)]
struct Artist {
    dir: DualDirectory,
}

impl Artist {
    fn album_count(&self) -> usize {
        self.dir.directories().len()
    }
}

fn library(td: &TempDir) -> TypedDirectory<Artist> {
    let root = DualDirectory::new(td.path().join("fast/music"), td.path().join("slow/music")).unwrap();
    TypedDirectory::new(root, |dir| Artist { dir })
}

#[test]
fn every_child_comes_from_the_factory() {
    let td = TempDir::new().unwrap();
    td.child("fast/music/Nina/Album1/t1.flac").write_str("1").unwrap();
    td.child("slow/music/Nina/Album2/t1.flac").write_str("2").unwrap();
    td.child("slow/music/Miles/Kind/t1.flac").write_str("3").unwrap();
    let lib = library(&td);

    let artists = lib.directories();
    let names: Vec<String> = artists.iter().map(|a| a.dir.name().into_owned()).collect();
    assert_eq!(names, vec!["Miles", "Nina"]);
    assert_eq!(artists[1].album_count(), 2);

    let nina = lib.directory("Nina").unwrap();
    assert_eq!(nina.album_count(), 2);
}

#[test]
fn typed_create_directory_does_no_io() {
    let td = TempDir::new().unwrap();
    let lib = library(&td);
    let newcomer = lib.create_directory("Newcomer").unwrap();
    assert!(!newcomer.dir.exists());
    assert!(lib.directory("bad/name").is_err());

    let plain: &DualDirectory = lib.as_ref();
    assert_eq!(plain.name(), "music");
    assert_eq!(lib.clone().into_dir().name(), "music");
}
