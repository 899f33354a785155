//! Utilidades de rutas léxicas (sin tocar el disco, salvo para leer el
//! directorio de trabajo al resolver rutas relativas).
//!
//! Los registros de archivo llegan con rutas como `./test/src/fixture.css`;
//! aquí las normalizamos igual que lo haría el colaborador de stream antes de
//! calcular rutas relativas, directorios y uniones para los source maps.

use std::path::{Component, Path, PathBuf};

/// Normaliza una ruta de forma léxica: elimina `.` y resuelve `..` cuando hay
/// un componente previo que consumir. Una ruta vacía se convierte en `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// `join` + `normalize`, como `path.join` en otros ecosistemas.
pub fn join(base: &Path, tail: impl AsRef<Path>) -> PathBuf {
    normalize(&base.join(tail))
}

/// Directorio contenedor; `.` cuando la ruta no tiene padre útil.
pub fn dirname(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Ruta absoluta normalizada: las relativas se resuelven contra el directorio
/// de trabajo actual. Si éste no se puede leer se conserva la ruta normalizada.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Ruta de `to` relativa a `from`. Ambas se resuelven primero a absolutas.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from = absolute(from);
    let to = absolute(to);
    match pathdiff::diff_paths(&to, &from) {
        Some(diff) if !diff.as_os_str().is_empty() => diff,
        Some(_) => PathBuf::from("."),
        None => to,
    }
}

/// Representación con `/` como separador (formato usado dentro de source maps).
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_cur_dir_and_parent() {
        assert_eq!(normalize(Path::new("./test/src/../fixture.css")), PathBuf::from("test/fixture.css"));
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn join_normalizes_dot_dirname() {
        assert_eq!(join(Path::new("."), "fixture.css"), PathBuf::from("fixture.css"));
        assert_eq!(join(Path::new("src"), "../fixture.css"), PathBuf::from("fixture.css"));
    }

    #[test]
    fn dirname_of_bare_file_is_dot() {
        assert_eq!(dirname(Path::new("fixture.css")), PathBuf::from("."));
        assert_eq!(dirname(Path::new("src/fixture.css")), PathBuf::from("src"));
    }

    #[test]
    fn relative_between_siblings_and_children() {
        assert_eq!(relative(Path::new("/p/test/src"), Path::new("/p/test/src/fixture.css")), PathBuf::from("fixture.css"));
        assert_eq!(relative(Path::new("/p/test"), Path::new("/p/test/src/fixture.css")), PathBuf::from("src/fixture.css"));
        assert_eq!(relative(Path::new("/p/out"), Path::new("/p/src/a.css")), PathBuf::from("../src/a.css"));
        assert_eq!(relative(Path::new("/p"), Path::new("/p")), PathBuf::from("."));
    }

    #[test]
    fn relative_resolves_mixed_inputs_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(relative(Path::new("."), &cwd.join("x/a.css")), PathBuf::from("x/a.css"));
        assert_eq!(relative(&cwd.join("out"), Path::new("src/a.css")), PathBuf::from("../src/a.css"));
    }

    #[test]
    fn absolute_resolves_relative_paths() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("./test/src/../a.css")), cwd.join("test/a.css"));
        assert_eq!(absolute(Path::new("/x/./y")), PathBuf::from("/x/y"));
    }
}
