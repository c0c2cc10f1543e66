//! Environment expansion tests: ordering, visibility relays and units.

use strata_lib::platform::arch::Arch;
use strata_lib::platform::os::Os;
use strata_lib::{
  AsPolicy, Category, Compiler, Configuration, Decorator, Error, Facet, NamespaceId, Platform, Selector, Settings,
  Syntax,
};

use super::common::{TestProject, position, strings};

const ROOT: NamespaceId = NamespaceId::ROOT;

// ==========================================================================
// End-to-end scenarios
// ==========================================================================

#[test]
fn base_defines_precede_target_defines() {
  let mut t = TestProject::new();
  let lib = t
    .project
    .library(ROOT, "Lib", |b| {
      b.facet_mut().define(["A", "B"])?;
      Ok(())
    })
    .unwrap();

  let env = t.project.environment("linux64", "debug", "clang").unwrap();
  let facet = env.expand(&t.project, lib).unwrap();

  assert_eq!(
    strings(&facet, Category::Define),
    vec![
      "BUILD_ENVIRONMENT=linux64-debug-clang",
      "BUILD_PLATFORM=linux64",
      "BUILD_CONFIG=debug",
      "BUILD_COMPILER=clang",
      "BUILD_TARGET=Lib",
      "BUILD_TARGET_PATH=/Lib",
      "A",
      "B",
    ]
  );
  assert!(facet.is_frozen());
}

#[test]
fn private_dependency_headers_do_not_propagate() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let lib = p.library(ROOT, "Lib", |_| Ok(())).unwrap();
  let app = p
    .executable(ROOT, "App", |b| {
      b.private(lib)?;
      Ok(())
    })
    .unwrap();
  let suite = p
    .executable(ROOT, "Suite", |b| {
      b.public(app)?;
      Ok(())
    })
    .unwrap();

  let env = p.environment("linux64", "debug", "clang").unwrap();
  let lib_public = p.target(lib).unwrap().public_dir().to_string_lossy().into_owned();
  let app_public = p.target(app).unwrap().public_dir().to_string_lossy().into_owned();

  let app_facet = env.expand(p, app).unwrap();
  assert!(strings(&app_facet, Category::IncludePath).contains(&lib_public));

  let suite_facet = env.expand(p, suite).unwrap();
  let suite_paths = strings(&suite_facet, Category::IncludePath);
  assert!(suite_paths.contains(&app_public));
  assert!(!suite_paths.contains(&lib_public));
}

// ==========================================================================
// Target contribution
// ==========================================================================

#[test]
fn forced_includes_relay_through_public_dependencies_only() {
  let mut t = TestProject::new();
  let p = &mut t.project;
  let lib = p
    .library(ROOT, "lib", |b| {
      b.forced_include("lib_prelude.h").public_include("api");
      Ok(())
    })
    .unwrap();
  let public_user = p
    .library(ROOT, "public_user", |b| {
      b.public(lib)?;
      Ok(())
    })
    .unwrap();
  let private_user = p
    .library(ROOT, "private_user", |b| {
      b.private(lib)?;
      Ok(())
    })
    .unwrap();

  let env = p.environment("linux64", "debug", "clang").unwrap();
  let api = p.target(lib).unwrap().source_dir().join("api").to_string_lossy().into_owned();

  let own = env.expand(p, lib).unwrap();
  assert_eq!(strings(&own, Category::Include), vec!["lib_prelude.h"]);

  let public = env.expand(p, public_user).unwrap();
  assert_eq!(strings(&public, Category::Include), vec!["lib_prelude.h"]);
  assert!(strings(&public, Category::IncludePath).contains(&api));

  let private = env.expand(p, private_user).unwrap();
  assert!(strings(&private, Category::Include).is_empty());
  assert!(!strings(&private, Category::IncludePath).contains(&api));
}

#[test]
fn private_directory_is_included_only_when_present() {
  let mut t = TestProject::new();
  t.mkdir("with/private");
  let with = t.project.library(ROOT, "with", |_| Ok(())).unwrap();
  let without = t.project.library(ROOT, "without", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  let with_private = t.project.target(with).unwrap().private_dir().to_string_lossy().into_owned();
  let without_private = t.project.target(without).unwrap().private_dir().to_string_lossy().into_owned();

  let facet = env.expand(&t.project, with).unwrap();
  assert!(strings(&facet, Category::IncludePath).contains(&with_private));
  let facet = env.expand(&t.project, without).unwrap();
  assert!(!strings(&facet, Category::IncludePath).contains(&without_private));
}

#[test]
fn own_directories_precede_dependency_directories() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();
  let app = t
    .project
    .executable(ROOT, "app", |b| {
      b.private(lib)?;
      Ok(())
    })
    .unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();
  let facet = env.expand(&t.project, app).unwrap();

  let app_target = t.project.target(app).unwrap();
  let own_source = app_target.source_dir().to_string_lossy().into_owned();
  let own_public = app_target.public_dir().to_string_lossy().into_owned();
  let dep_public = t.project.target(lib).unwrap().public_dir().to_string_lossy().into_owned();

  assert!(position(&facet, Category::IncludePath, &own_source) < position(&facet, Category::IncludePath, &own_public));
  assert!(position(&facet, Category::IncludePath, &own_public) < position(&facet, Category::IncludePath, &dep_public));
}

#[test]
fn target_variables_are_substituted() {
  let mut t = TestProject::new();
  let engine = t.project.namespace(ROOT, "engine", |_| Ok(())).unwrap();
  let core = t
    .project
    .library(engine, "core", |b| {
      b.facet_mut().define("$TARGET$_EXPORTS")?;
      b.facet_mut().include_path("$TARGET_DIR$/include")?;
      b.pch("pch.h", "pch.cpp");
      b.facet_mut().pch_option("-include $PCH_HEADER$")?;
      Ok(())
    })
    .unwrap();

  let env = t.project.environment("win64", "release", "msvc").unwrap();
  let facet = env.expand(&t.project, core).unwrap();
  let target_dir = t.root().join("build/win64/release/engine/core");

  assert!(strings(&facet, Category::Define).contains(&"core_EXPORTS".to_string()));
  assert!(strings(&facet, Category::IncludePath).contains(&format!("{}/include", target_dir.display())));
  assert_eq!(strings(&facet, Category::PchOption), vec!["-include pch.h"]);
}

#[test]
fn strict_mode_rejects_redeclared_literals() {
  let mut t = TestProject::with_settings(Settings::default().with_strict(true));

  let err = t
    .project
    .library(ROOT, "lib", |b| {
      b.facet_mut().compiler_option("-Wall")?.compiler_option("-Wall")?;
      b.facet_mut().define("API")?;
      b.facet_mut().define("API")?;
      Ok(())
    })
    .unwrap_err();

  assert!(matches!(err, Error::Values(_)));
  assert!(err.to_string().contains("API"));
}

#[test]
fn expansion_is_frozen_and_leaves_base_untouched() {
  let mut t = TestProject::new();
  let lib = t
    .project
    .library(ROOT, "lib", |b| {
      b.facet_mut().define("LIB")?;
      Ok(())
    })
    .unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  let mut facet = env.expand(&t.project, lib).unwrap();
  assert!(matches!(facet.define("LATE"), Err(Error::FrozenFacet { .. })));
  assert_eq!(env.base_facet().unwrap().get(Category::Define).len(), 4);
  assert_eq!(env.expand(&t.project, lib).unwrap(), facet);
}

#[test]
fn fingerprint_tracks_configuration() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();

  let debug = t.project.environment("linux64", "debug", "clang").unwrap();
  let release = t.project.environment("linux64", "release", "clang").unwrap();

  assert_eq!(
    debug.fingerprint(&t.project, lib).unwrap(),
    debug.fingerprint(&t.project, lib).unwrap()
  );
  assert_ne!(
    debug.fingerprint(&t.project, lib).unwrap(),
    release.fingerprint(&t.project, lib).unwrap()
  );
}

// ==========================================================================
// Policies
// ==========================================================================

fn ordered_project() -> TestProject {
  let mut t = TestProject::bare();
  let p = &mut t.project;

  let mut platform = Platform::new("linux64", Os::Linux, Arch::X86_64);
  platform.policy_mut().add_customization(|out, _, _| {
    out.compiler_option("platform")?;
    Ok(())
  });
  let mut configuration = Configuration::new("debug");
  configuration.policy_mut().add_customization(|out, _, _| {
    out.compiler_option("config")?;
    Ok(())
  });
  let mut compiler = Compiler::new("clang", Syntax::Gnu);
  compiler.policy_mut().add_customization(|out, _, _| {
    out.compiler_option("compiler")?;
    Ok(())
  });
  p.add_platform(platform).unwrap();
  p.add_configuration(configuration).unwrap();
  p.add_compiler(compiler).unwrap();
  t
}

#[test]
fn customizations_run_target_namespaces_then_environment() {
  let mut t = ordered_project();
  let p = &mut t.project;

  p.configure_namespace(ROOT, |ns| {
    ns.facet_mut().define("ROOT_NS")?;
    ns.add_customization(|out, _, _| {
      out.compiler_option("root")?;
      Ok(())
    });
    Ok(())
  })
  .unwrap();
  let engine = p
    .namespace(ROOT, "engine", |ns| {
      ns.facet_mut().define("ENGINE_NS")?;
      ns.add_customization(|out, _, _| {
        out.compiler_option("engine")?;
        Ok(())
      });
      Ok(())
    })
    .unwrap();
  let core = p
    .library(engine, "core", |b| {
      b.facet_mut().define("CORE")?;
      b.add_customization(|out, _, target| {
        out.compiler_option(format!("target:{}", target.path()))?;
        Ok(())
      });
      Ok(())
    })
    .unwrap();

  let env = p.environment("linux64", "debug", "clang").unwrap();
  let facet = env.expand(p, core).unwrap();

  assert_eq!(
    strings(&facet, Category::CompilerOption),
    vec!["target:/engine/core", "root", "engine", "platform", "config", "compiler"]
  );
  let defines = strings(&facet, Category::Define);
  assert_eq!(&defines[defines.len() - 3..], ["ROOT_NS", "ENGINE_NS", "CORE"]);
}

#[test]
fn namespace_tag_rules_follow_target_tags() {
  let mut t = TestProject::new();
  let p = &mut t.project;

  let mut gui = Facet::new();
  gui.define("WITH_GUI").unwrap();
  p.configure_namespace(ROOT, move |ns| {
    ns.on_tag("gui", gui);
    Ok(())
  })
  .unwrap();

  let editor = p
    .executable(ROOT, "editor", |b| {
      b.tag("gui")?;
      Ok(())
    })
    .unwrap();
  let server = p.executable(ROOT, "server", |_| Ok(())).unwrap();

  let env = p.environment("linux64", "debug", "clang").unwrap();
  assert!(strings(&env.expand(p, editor).unwrap(), Category::Define).contains(&"WITH_GUI".to_string()));
  assert!(!strings(&env.expand(p, server).unwrap(), Category::Define).contains(&"WITH_GUI".to_string()));
}

#[test]
fn project_decorators_apply_per_environment() {
  let mut t = TestProject::new();
  let p = &mut t.project;

  let mut windows = Facet::new();
  windows.define("WIN32_LEAN_AND_MEAN").unwrap();
  let mut decorator = Decorator::new();
  decorator.register_filtered(Some(Selector::regex("win(32|64)").unwrap()), None, None, windows);
  p.add_decorator(decorator);

  let lib = p.library(ROOT, "lib", |_| Ok(())).unwrap();

  let win = p.environment("win64", "debug", "msvc").unwrap();
  let linux = p.environment("linux64", "debug", "clang").unwrap();
  assert!(strings(&win.expand(p, lib).unwrap(), Category::Define).contains(&"WIN32_LEAN_AND_MEAN".to_string()));
  assert!(!strings(&linux.expand(p, lib).unwrap(), Category::Define).contains(&"WIN32_LEAN_AND_MEAN".to_string()));
}

#[test]
fn flag_translation_spells_categories_for_the_compiler() {
  let mut t = TestProject::bare();
  let p = &mut t.project;
  p.add_platform(Platform::new("linux64", Os::Linux, Arch::X86_64)).unwrap();
  p.add_configuration(Configuration::new("debug")).unwrap();
  p.add_compiler(Compiler::new("gcc", Syntax::Gnu).with_flag_translation()).unwrap();

  let lib = p
    .library(ROOT, "lib", |b| {
      b.facet_mut().define("API")?.library("m")?;
      Ok(())
    })
    .unwrap();

  let env = p.environment("linux64", "debug", "gcc").unwrap();
  let facet = env.expand(p, lib).unwrap();
  let public = p.target(lib).unwrap().public_dir();

  let options = strings(&facet, Category::CompilerOption);
  assert!(options.contains(&"-DAPI".to_string()));
  assert!(options.contains(&format!("-I{}", public.display())));
  assert_eq!(strings(&facet, Category::LinkerOption), vec!["-lm"]);
}

// ==========================================================================
// Units
// ==========================================================================

#[test]
fn unit_without_override_extends_target_expansion() {
  let mut t = TestProject::new();
  let lib = t
    .project
    .library(ROOT, "lib", |b| {
      b.facet_mut().define("LIB")?;
      b.unit("simd", |u| {
        u.add_files(["simd.cpp"]);
        u.facet_mut().compiler_option("-mavx2")?;
        Ok(())
      })?;
      Ok(())
    })
    .unwrap();

  let env = t.project.environment("linux64", "debug", "clang").unwrap();
  let facet = env.expand_unit(&t.project, lib, "simd").unwrap();

  assert!(strings(&facet, Category::Define).contains(&"LIB".to_string()));
  assert_eq!(strings(&facet, Category::CompilerOption), vec!["-mavx2"]);
  assert!(facet.is_frozen());
}

#[test]
fn unit_override_rebuilds_from_override_compiler() {
  let mut t = TestProject::bare();
  let p = &mut t.project;
  p.add_platform(Platform::new("win64", Os::Windows, Arch::X86_64)).unwrap();
  p.add_configuration(Configuration::new("debug")).unwrap();
  let mut msvc = Compiler::new("msvc", Syntax::Msvc);
  msvc.facet_mut().define("MSVC_ONLY").unwrap();
  p.add_compiler(msvc).unwrap();
  let mut rc = Compiler::new("rc", Syntax::Msvc);
  rc.facet_mut().define("RC_INVOKED").unwrap();
  p.add_compiler(rc).unwrap();

  let lib = p.library(ROOT, "lib", |_| Ok(())).unwrap();
  let app = p
    .executable(ROOT, "app", |b| {
      b.private(lib)?;
      let rc = b.project().compiler("rc")?;
      b.unit("resources", move |u| {
        u.add_files(["app.rc"]).set_compiler(rc);
        Ok(())
      })?;
      Ok(())
    })
    .unwrap();

  let env = p.environment("win64", "debug", "msvc").unwrap();
  let facet = env.expand_unit(p, app, "resources").unwrap();
  let defines = strings(&facet, Category::Define);
  let lib_public = p.target(lib).unwrap().public_dir().to_string_lossy().into_owned();

  assert_eq!(facet.compiler(), Some("rc"));
  assert!(defines.contains(&"RC_INVOKED".to_string()));
  assert!(defines.contains(&"BUILD_COMPILER=rc".to_string()));
  assert!(!defines.contains(&"MSVC_ONLY".to_string()));
  assert!(strings(&facet, Category::IncludePath).contains(&lib_public));
}

#[test]
fn unknown_unit_is_an_error() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();
  let env = t.project.environment("linux64", "debug", "clang").unwrap();

  assert!(matches!(
    env.expand_unit(&t.project, lib, "missing"),
    Err(Error::UnknownUnit { .. })
  ));
}

#[test]
fn environments_share_nothing_between_expansions() {
  let mut t = TestProject::new();
  let lib = t.project.library(ROOT, "lib", |_| Ok(())).unwrap();

  for env in t.project.environments() {
    let facet = env.expand(&t.project, lib).unwrap();
    assert_eq!(facet.compiler(), Some(env.compiler_name()));
    assert_eq!(
      strings(&facet, Category::Define)[0],
      format!("BUILD_ENVIRONMENT={env}")
    );
  }
  assert_eq!(t.project.environments().len(), 6);
}
