use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// Directory manifests are written to
    pub fn manifest_dir(&self) -> PathBuf {
        self.root.path().join("manifests")
    }

    pub fn manifest_path(&self, project: &str) -> PathBuf {
        self.manifest_dir()
            .join(format!("docker-compose.{project}.yml"))
    }

    /// deployer.yml with the given apply command, writing into `manifest_dir()`
    #[allow(dead_code)]
    pub fn write_config(&self, program: &str, args: &[&str]) -> PathBuf {
        let args = args
            .iter()
            .map(|arg| format!("\"{arg}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let content = format!(
            "manifest_dir: {}\napply:\n  program: {program}\n  args: [{args}]\n",
            self.manifest_dir().display()
        );
        let path = self.root.path().join("deployer.yml");
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}
