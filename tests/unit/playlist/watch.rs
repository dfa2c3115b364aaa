use std::time::{Duration, SystemTime};

use super::*;

fn temp_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("avmix_watch_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn touch(path: &Path, text: &str, secs: u64) {
    std::fs::write(path, text).unwrap();
    let f = std::fs::File::options().write(true).open(path).unwrap();
    f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

#[test]
fn reports_contents_once_per_change() {
    let path = temp_file("playlist.json");
    touch(&path, "[]", 1_000);
    let mut w = FileWatch::new(&path);
    assert_eq!(w.poll().unwrap().as_deref(), Some("[]"));
    assert_eq!(w.poll().unwrap(), None);

    touch(&path, "{}", 2_000);
    assert_eq!(w.poll().unwrap().as_deref(), Some("{}"));
    assert_eq!(w.poll().unwrap(), None);
}

#[test]
fn primed_watch_skips_current_contents() {
    let path = temp_file("primed.json");
    touch(&path, "[]", 1_000);
    let mut w = FileWatch::primed(&path);
    assert_eq!(w.poll().unwrap(), None);
    touch(&path, "[1]", 3_000);
    assert_eq!(w.poll().unwrap().as_deref(), Some("[1]"));
}

#[test]
fn missing_file_is_not_a_change() {
    let mut w = FileWatch::new(temp_file("does_not_exist.json"));
    assert_eq!(w.poll().unwrap(), None);
}
