use autokit_fs::RemotePath;
use rstest::rstest;

#[rstest]
#[case("/outbound", "a.csv", "/outbound/a.csv")]
#[case("/outbound/", "a.csv", "/outbound/a.csv")]
#[case("/", "a.csv", "/a.csv")]
#[case("in\\bound", "a.csv", "in/bound/a.csv")]
fn test_join(#[case] base: &str, #[case] name: &str, #[case] expected: &str) {
    assert_eq!(RemotePath::new(base).join(name).as_str(), expected);
}

#[test]
fn test_parent() {
    let path = RemotePath::new("/foo/bar/baz.txt");
    assert_eq!(path.parent().unwrap().as_str(), "/foo/bar");
    assert_eq!(RemotePath::new("/foo").parent().unwrap().as_str(), "/");
}

#[test]
fn test_file_name() {
    let path = RemotePath::new("/foo/bar/baz.txt");
    assert_eq!(path.file_name(), Some("baz.txt"));
}

#[test]
fn test_display_matches_as_str() {
    let path = RemotePath::new("/data/in");
    assert_eq!(path.to_string(), path.as_str());
}
