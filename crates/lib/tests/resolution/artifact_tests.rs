//! Artifact kind and path derivation.

use std::path::{Component, PathBuf};

use strata_lib::{Error, LinkMode, NamespaceId, OutputKind};

use super::common::TestProject;

const ROOT: NamespaceId = NamespaceId::ROOT;

// ==========================================================================
// Kinds
// ==========================================================================

#[test]
fn headers_produce_no_artifact() {
  let mut t = TestProject::new();
  let api = t.project.headers(ROOT, "api", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  assert_eq!(env.derive_artifact_kind(&t.project, api).unwrap(), None);
  assert_eq!(
    env.derive_artifact_path(&t.project, api, &OutputKind::Headers).unwrap(),
    None
  );
}

#[test]
fn dynamic_executable_is_rejected() {
  let mut t = TestProject::new();
  let app = t
    .project
    .executable(ROOT, "app", |b| {
      b.link(LinkMode::Dynamic);
      Ok(())
    })
    .unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  let err = env.derive_artifact_kind(&t.project, app).unwrap_err();
  assert!(matches!(err, Error::ExecutableRequiresStatic { ref target } if target == "/app"));
}

#[test]
fn library_link_follows_configuration_unless_explicit() {
  let mut t = TestProject::new();
  let core = t.project.library(ROOT, "core", |_| Ok(())).unwrap();
  let pinned = t
    .project
    .library(ROOT, "pinned", |b| {
      b.link(LinkMode::Static);
      Ok(())
    })
    .unwrap();
  let app = t.project.executable(ROOT, "app", |_| Ok(())).unwrap();

  let debug = t.project.environment("linux64", "debug", "clang").unwrap();
  let release = t.project.environment("linux64", "release", "clang").unwrap();

  assert_eq!(
    debug.derive_artifact_kind(&t.project, core).unwrap(),
    Some(OutputKind::StaticLibrary)
  );
  assert_eq!(
    release.derive_artifact_kind(&t.project, core).unwrap(),
    Some(OutputKind::SharedLibrary)
  );
  assert_eq!(
    release.derive_artifact_kind(&t.project, pinned).unwrap(),
    Some(OutputKind::StaticLibrary)
  );
  assert_eq!(
    release.derive_artifact_kind(&t.project, app).unwrap(),
    Some(OutputKind::Executable)
  );
}

// ==========================================================================
// Paths
// ==========================================================================

#[test]
fn library_paths_use_platform_naming() {
  let mut t = TestProject::new();
  let engine = t.project.namespace(ROOT, "engine", |_| Ok(())).unwrap();
  let core = t.project.library(engine, "core", |_| Ok(())).unwrap();

  let linux = t.project.environment("linux64", "debug", "clang").unwrap();
  let win = t.project.environment("win64", "release", "msvc").unwrap();

  assert_eq!(
    linux.derive_artifact_path(&t.project, core, &OutputKind::StaticLibrary).unwrap(),
    Some(t.root().join("build/linux64/debug/engine/core/libcore.a"))
  );
  assert_eq!(
    linux.derive_artifact_path(&t.project, core, &OutputKind::SharedLibrary).unwrap(),
    Some(t.root().join("build/linux64/debug/engine/core/libcore.so"))
  );
  assert_eq!(
    win.derive_artifact_path(&t.project, core, &OutputKind::SharedLibrary).unwrap(),
    Some(t.root().join("build/win64/release/engine/core/core.dll"))
  );
}

#[test]
fn executable_and_debug_symbol_paths() {
  let mut t = TestProject::new();
  let app = t.project.executable(ROOT, "app", |_| Ok(())).unwrap();
  let linux = t.project.environment("linux64", "debug", "clang").unwrap();
  let win = t.project.environment("win64", "debug", "msvc").unwrap();

  assert_eq!(
    linux.derive_artifact_path(&t.project, app, &OutputKind::Executable).unwrap(),
    Some(t.root().join("build/linux64/debug/app/app"))
  );
  assert_eq!(
    win.derive_artifact_path(&t.project, app, &OutputKind::Executable).unwrap(),
    Some(t.root().join("build/win64/debug/app/app.exe"))
  );
  assert_eq!(
    win.derive_artifact_path(&t.project, app, &OutputKind::DebugSymbols).unwrap(),
    Some(t.root().join("build/win64/debug/app/app.pdb"))
  );
}

#[test]
fn object_paths_mirror_source_layout() {
  let mut t = TestProject::new();
  let app = t.project.executable(ROOT, "app", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();
  let absolute = t.root().join("app/src/main.cpp");

  assert_eq!(
    env.derive_artifact_path(&t.project, app, &OutputKind::Object(absolute)).unwrap(),
    Some(t.root().join("build/linux64/debug/app/obj/src/main.cpp.o"))
  );
  assert_eq!(
    env
      .derive_artifact_path(&t.project, app, &OutputKind::Object(PathBuf::from("main.cpp")))
      .unwrap(),
    Some(t.root().join("build/linux64/debug/app/obj/main.cpp.o"))
  );
}

#[test]
fn pch_path_uses_compiler_suffix() {
  let mut t = TestProject::new();
  let app = t
    .project
    .executable(ROOT, "app", |b| {
      b.pch("include/stdafx.h", "stdafx.cpp");
      Ok(())
    })
    .unwrap();
  let linux = t.project.environment("linux64", "debug", "clang").unwrap();
  let win = t.project.environment("win64", "debug", "msvc").unwrap();

  assert_eq!(
    linux.derive_artifact_path(&t.project, app, &OutputKind::Pch).unwrap(),
    Some(t.root().join("build/linux64/debug/app/stdafx.h.gch"))
  );
  assert_eq!(
    win.derive_artifact_path(&t.project, app, &OutputKind::Pch).unwrap(),
    Some(t.root().join("build/win64/debug/app/stdafx.h.pch"))
  );
}

#[test]
fn mismatched_output_kinds_are_unsupported() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();
  let ext = t.project.external(ROOT, "zlib", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  for (id, kind) in [
    (lib, OutputKind::Executable),
    (lib, OutputKind::Pch),
    (ext, OutputKind::Object(PathBuf::from("inflate.c"))),
    (ext, OutputKind::DebugSymbols),
  ] {
    let err = env.derive_artifact_path(&t.project, id, &kind).unwrap_err();
    assert!(
      matches!(err, Error::UnsupportedArtifact { ref kind, .. } if !kind.is_empty()),
      "{err}"
    );
  }
}

#[test]
fn objects_for_outside_sources_stay_in_object_dir() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();
  let obj_dir = t.root().join("build/linux64/debug/lib/obj");
  let object = |source: PathBuf| {
    env
      .derive_artifact_path(&t.project, lib, &OutputKind::Object(source))
      .unwrap()
      .unwrap()
  };

  let generated = object(PathBuf::from("/elsewhere/gen.cpp"));
  let other = object(PathBuf::from("/other/gen.cpp"));
  let climbing = object(PathBuf::from("../escape.cpp"));

  for path in [&generated, &other, &climbing] {
    assert!(path.starts_with(obj_dir.join("external")), "{}", path.display());
    assert!(!path.components().any(|c| c == Component::ParentDir), "{}", path.display());
  }
  assert!(generated.ends_with("gen.cpp.o"));
  assert!(climbing.ends_with("escape.cpp.o"));
  assert_ne!(generated, other);
  assert_eq!(generated, object(PathBuf::from("/elsewhere/gen.cpp")));
}
