//! Discovery of partial templates under the views root.

use super::partial::Partial;
use crate::error::Result;
use crate::resource::Resource;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory of refetch partials inside a model's view directory.
const REFETCH_DIR: &str = "refetch";

/// A partial template file, `_<name>.<ext>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialFile {
    pub name: String,
    pub refetch: bool,
}

impl PartialFile {
    /// Parse a file name; anything not shaped `_<name>.<ext>` is ignored.
    pub fn parse(filename: &str, refetch: bool) -> Option<Self> {
        let rest = filename.strip_prefix('_')?;
        let (name, _ext) = rest.split_once('.')?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            refetch,
        })
    }
}

/// Partials available per model, read from `views_root/<plural>/`.
#[derive(Clone, Debug)]
pub struct PartialCatalog {
    root: PathBuf,
}

impl PartialCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Plain partials, then refetch partials, each sorted by name.
    pub fn files(&self, plural: &str) -> Result<Vec<PartialFile>> {
        let dir = self.root.join(plural);
        let mut files = scan(&dir, false)?;
        files.extend(scan(&dir.join(REFETCH_DIR), true)?);
        Ok(files)
    }

    /// Every partial of the resource, bound to its scope chain.
    pub fn partials(&self, resource: &Resource) -> Result<Vec<Partial>> {
        Ok(self
            .files(resource.plural_name())?
            .into_iter()
            .map(|file| bind(file, resource))
            .collect())
    }

    /// The plain and refetch partials named `name`.
    pub fn named(&self, resource: &Resource, name: &str) -> Result<Vec<Partial>> {
        Ok(self
            .files(resource.plural_name())?
            .into_iter()
            .filter(|file| file.name == name)
            .map(|file| bind(file, resource))
            .collect())
    }

    pub fn find(&self, resource: &Resource, name: &str) -> Result<Option<Partial>> {
        let dir = self.root.join(resource.plural_name());
        Ok(scan(&dir, false)?
            .into_iter()
            .find(|file| file.name == name)
            .map(|file| bind(file, resource)))
    }

    pub fn find_refetch(&self, resource: &Resource, name: &str) -> Result<Option<Partial>> {
        let dir = self.root.join(resource.plural_name()).join(REFETCH_DIR);
        Ok(scan(&dir, true)?
            .into_iter()
            .find(|file| file.name == name)
            .map(|file| bind(file, resource)))
    }

    /// Plural names of models that have refetch partials.
    pub fn refetch_models(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut models = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.path().join(REFETCH_DIR).is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    models.push(name.to_string());
                }
            }
        }
        models.sort();
        Ok(models)
    }
}

fn bind(file: PartialFile, resource: &Resource) -> Partial {
    if file.refetch {
        Partial::refetch(file.name, resource.clone())
    } else {
        Partial::new(file.name, resource.clone())
    }
}

fn scan(dir: &Path, refetch: bool) -> Result<Vec<PartialFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(file) = entry.file_name().to_str().and_then(|n| PartialFile::parse(n, refetch)) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityRef, ModelName};
    use tempfile::TempDir;

    fn views() -> TempDir {
        let dir = TempDir::new().unwrap();
        let users = dir.path().join("users");
        fs::create_dir_all(users.join("refetch")).unwrap();
        fs::write(users.join("_show.html.erb"), "").unwrap();
        fs::write(users.join("_list_row.html.erb"), "").unwrap();
        fs::write(users.join("index.html.erb"), "").unwrap();
        fs::write(users.join("refetch").join("_show.html.erb"), "").unwrap();
        fs::create_dir_all(dir.path().join("todos")).unwrap();
        dir
    }

    fn user() -> Resource {
        Resource::new(EntityRef::new(ModelName::new("user"), 1))
    }

    #[test]
    fn test_parse_partial_file() {
        assert_eq!(
            PartialFile::parse("_show.html.erb", false),
            Some(PartialFile {
                name: "show".into(),
                refetch: false
            })
        );
        assert_eq!(PartialFile::parse("show.html.erb", false), None);
        assert_eq!(PartialFile::parse("_show", false), None);
    }

    #[test]
    fn test_partials_lists_plain_then_refetch() {
        let dir = views();
        let catalog = PartialCatalog::new(dir.path());

        let partials = catalog.partials(&user()).unwrap();
        let names: Vec<(&str, bool)> = partials.iter().map(|p| (p.name(), p.is_refetch())).collect();
        assert_eq!(names, vec![("list_row", false), ("show", false), ("show", true)]);
        assert_eq!(catalog.named(&user(), "show").unwrap().len(), 2);
    }

    #[test]
    fn test_find() {
        let dir = views();
        let catalog = PartialCatalog::new(dir.path());

        assert!(catalog.find(&user(), "list_row").unwrap().is_some());
        assert!(catalog.find_refetch(&user(), "list_row").unwrap().is_none());
        assert!(catalog.find_refetch(&user(), "show").unwrap().unwrap().is_refetch());
    }

    #[test]
    fn test_refetch_models() {
        let dir = views();
        let catalog = PartialCatalog::new(dir.path());
        assert_eq!(catalog.refetch_models().unwrap(), vec!["users".to_string()]);

        let missing = PartialCatalog::new(dir.path().join("missing"));
        assert!(missing.refetch_models().unwrap().is_empty());
        assert!(missing.partials(&user()).unwrap().is_empty());
    }
}
