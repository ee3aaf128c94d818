use std::io::Write as _;
use std::path::PathBuf;

use citadel::config::Config;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.root_dir, PathBuf::from("."));
    assert_eq!(cfg.max_connections, 1024);
    assert_eq!(cfg.workers, 8);
}

#[test]
fn test_config_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "listen_addr: \"0.0.0.0:3000\"").unwrap();
    writeln!(file, "root_dir: /srv/www").unwrap();
    writeln!(file, "max_connections: 64").unwrap();
    writeln!(file, "workers: 4").unwrap();

    let cfg = Config::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.root_dir, PathBuf::from("/srv/www"));
    assert_eq!(cfg.max_connections, 64);
    assert_eq!(cfg.workers, 4);
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "listen_addr: \"127.0.0.1:9999\"").unwrap();

    let cfg = Config::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:9999");
    assert_eq!(cfg.max_connections, 1024);
    assert_eq!(cfg.workers, 8);
}

#[test]
fn test_config_from_missing_file_fails() {
    assert!(Config::from_file("/does/not/exist.yaml").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
    assert_eq!(cfg1.root_dir, cfg2.root_dir);
}
