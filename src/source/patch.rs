use super::{
    balance::{self, Imbalance},
    detect::Language,
    edit::{self, EditPlan, Placement},
    layout::Layout,
    templates::{self, JsonMap, Templates},
};
use crate::android::package::PackageId;
use once_cell_regex::regex;
use std::fmt::{self, Display};
use thiserror::Error;

/// Present in any class that's already been patched.
pub static MARKER: &str = "SmiSdkReactPackage";

static DEFAULT_INDENT: &str = "    ";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lifecycle {
    /// Appended to the body of an existing `onCreate`.
    Injected,
    /// A new `onCreate` override was added to the class.
    Synthesized,
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Injected => write!(f, "initialized in the existing `onCreate`"),
            Self::Synthesized => write!(f, "initialized in a new `onCreate`"),
        }
    }
}

#[derive(Debug)]
pub struct Patched {
    pub layout: Layout,
    pub lifecycle: Lifecycle,
    pub contents: String,
}

#[derive(Debug)]
pub enum Outcome {
    Patched(Patched),
    AlreadyApplied,
    AnchorNotMatched { anchor: &'static str },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    TemplateFailed(#[from] templates::Error),
    #[error("Failed to splice edits together: {0}")]
    EditFailed(#[from] edit::Error),
    #[error("The application class body couldn't be scanned: {0}")]
    SourceUnbalanced(#[source] Imbalance),
    #[error("Patching would leave the application class unbalanced: {0}")]
    PatchUnbalanced(#[source] Imbalance),
    #[error("The application class declaration has no body")]
    ClassBodyMissing,
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map_or(0, |newline| newline + 1)
}

fn line_indent(text: &str, at: usize) -> &str {
    let start = line_start(text, at);
    let line = &text[start..];
    let len = line.len() - line.trim_start_matches(&[' ', '\t'][..]).len();
    &line[..len]
}

/// Indentation of the first member of the class body.
fn member_indent(body: &str) -> &str {
    body.lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            let len = line.len() - line.trim_start_matches(&[' ', '\t'][..]).len();
            &line[..len]
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or(DEFAULT_INDENT)
}

fn class_package(text: &str) -> Option<&str> {
    regex!(r"(?m)^[ \t]*package\s+([\w.]+)")
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|package| package.as_str())
}

fn imports(text: &str, import: &str) -> bool {
    text.lines()
        .map(|line| line.trim().trim_end_matches(';').trim_end())
        .any(|line| line == import)
}

/// Plans and applies every edit needed to wire the SDK into `contents`.
///
/// `r_package` is where the app's `R` class is generated; it's imported when
/// the class lives in another package.
pub fn patch(
    templates: &Templates,
    language: Language,
    contents: &str,
    r_package: &PackageId,
) -> Result<Outcome, Error> {
    if contents.contains(MARKER) {
        log::info!("{} already registered", MARKER);
        return Ok(Outcome::AlreadyApplied);
    }
    let (layout, registration) = match Layout::detect(language, contents) {
        Some(found) => found,
        None => {
            log::warn!("no known package list layout matched");
            return Ok(Outcome::AnchorNotMatched {
                anchor: "package list",
            });
        }
    };
    log::info!("package list matches {} layout", layout);
    let declaration = match language.declaration().find(contents) {
        Some(declaration) => declaration,
        None => {
            return Ok(Outcome::AnchorNotMatched {
                anchor: "class declaration",
            })
        }
    };
    let interface = match language {
        Language::Java => regex!(r"\bimplements\b").find(declaration.as_str()),
        Language::Kotlin => regex!(r"\bApplication\(\)").find(declaration.as_str()),
    }
    .map(|found| declaration.start() + found.start()..declaration.start() + found.end());
    let interface = match interface {
        Some(interface) => interface,
        None => {
            return Ok(Outcome::AnchorNotMatched {
                anchor: "interface list",
            })
        }
    };
    let (open, close) = balance::block_after(contents, declaration.end())
        .map_err(Error::SourceUnbalanced)?
        .ok_or(Error::ClassBodyMissing)?;
    let indent = member_indent(&contents[open..close]);

    let r_package = r_package.as_str();
    let import_r = class_package(contents) != Some(r_package)
        && !imports(contents, &format!("import {}.R", r_package));
    let mut data = JsonMap::default();
    data.insert("package", r_package);
    data.insert("import-r", import_r);
    data.insert("indent", indent);
    data.insert("line-indent", line_indent(contents, registration.start));
    let render = |name: &str, data: &JsonMap| templates.render(language, name, data);

    let mut plan = EditPlan::default();

    // imports
    let import_block = render("imports", &data)?;
    let extra_import = layout
        .extra_import(language)
        .filter(|import| !imports(contents, import.trim_end_matches(';')));
    if let Some(first) = regex!(r"(?m)^[ \t]*import\s").find(contents) {
        let at = first.start()..first.start();
        if let Some(extra) = extra_import {
            plan.push("extra import", at.clone(), Placement::Before, format!("{}\n", extra));
        }
        plan.push("imports", at, Placement::Before, format!("{}\n", import_block));
    } else {
        let mut block = String::from("\n");
        if let Some(extra) = extra_import {
            block.push_str(extra);
            block.push('\n');
        }
        block.push_str(&import_block);
        block.push('\n');
        match regex!(r"(?m)^[ \t]*package\s[^\n]*\n?").find(contents) {
            Some(package) => plan.push("imports", package.range(), Placement::After, block),
            None => plan.push("imports", 0..0, Placement::Before, format!("{}\n", &block[1..])),
        }
    }

    plan.push(
        "registration",
        registration,
        layout.placement(),
        render(layout.template_name(), &data)?,
    );
    plan.push(
        "interface",
        interface,
        Placement::After,
        render("interface", &data)?,
    );

    // Members go on their own lines just above the closing brace.
    let members_at = {
        let start = line_start(contents, close);
        if contents[start..close].trim().is_empty() && start > open {
            start
        } else {
            close
        }
    };
    let super_call = regex!(r"super\.onCreate\(\)[ \t]*;?")
        .find_at(contents, open)
        .filter(|call| call.end() <= close);
    let lifecycle = match super_call {
        Some(call) => {
            data.insert("body-indent", line_indent(contents, call.start()));
            let init = render("init", &data)?;
            plan.push("init", call.range(), Placement::After, format!("\n{}", init));
            Lifecycle::Injected
        }
        None => {
            log::info!("no `super.onCreate()` call found; adding an `onCreate` override");
            data.insert("body-indent", indent.repeat(2));
            let init = render("init", &data)?;
            data.insert("init", init);
            let on_create = render("on-create", &data)?;
            plan.push(
                "on-create",
                members_at..members_at,
                Placement::Before,
                format!("\n{}\n", on_create),
            );
            Lifecycle::Synthesized
        }
    };
    plan.push(
        "on-change",
        members_at..members_at,
        Placement::Before,
        format!("\n{}\n", render("on-change", &data)?),
    );

    let contents = plan.apply(contents)?;
    balance::check(&contents).map_err(Error::PatchUnbalanced)?;
    Ok(Outcome::Patched(Patched {
        layout,
        lifecycle,
        contents,
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    const JAVA_LEGACY: &str = r#"package com.acme.app;

import android.app.Application;
import com.facebook.react.ReactApplication;
import com.facebook.react.shell.MainReactPackage;
import java.util.Arrays;
import java.util.List;

public class MainApplication extends Application implements ReactApplication {

    private final ReactNativeHost mReactNativeHost = new ReactNativeHost(this) {
        @Override
        protected List<ReactPackage> getPackages() {
            return Arrays.<ReactPackage>asList(
                new MainReactPackage()
            );
        }
    };

    @Override
    public void onCreate() {
        super.onCreate();
        SoLoader.init(this, /* native exopackage */ false);
    }
}
"#;

    const JAVA_062: &str = r#"package com.acme.app.core;

import android.app.Application;
import com.facebook.react.PackageList;
import java.util.List;

public class MainApplication extends Application implements ReactApplication {

  private final ReactNativeHost mReactNativeHost =
      new ReactNativeHost(this) {
        @Override
        protected List<ReactPackage> getPackages() {
          @SuppressWarnings("UnnecessaryLocalVariable")
          List<ReactPackage> packages = new PackageList(this).getPackages();
          return packages;
        }
      };
}
"#;

    const KOTLIN_LEGACY: &str = r#"package com.acme.app

import android.app.Application
import com.facebook.react.ReactApplication
import com.facebook.react.shell.MainReactPackage

class MainApplication : Application(), ReactApplication {

  private val mReactNativeHost = object : ReactNativeHost(this) {
    override fun getPackages(): List<ReactPackage> {
      return listOf<ReactPackage>(
          MainReactPackage()
      )
    }
  }

  override fun getReactNativeHost(): ReactNativeHost = mReactNativeHost
}
"#;

    const KOTLIN_074: &str = r#"package com.acme.app

import android.app.Application
import com.facebook.react.PackageList

class MainApplication : Application(), ReactApplication {

  override val reactNativeHost: ReactNativeHost =
      object : DefaultReactNativeHost(this) {
        override fun getPackages(): List<ReactPackage> =
            PackageList(this).packages.apply {
              // add(MyReactNativePackage())
            }
      }

  override fun onCreate() {
    super.onCreate()
    SoLoader.init(this, false)
  }
}
"#;

    const KOTLIN_073: &str = r#"package com.acme.app

import android.app.Application

class MainApplication : Application(), ReactApplication {

  override val reactNativeHost: ReactNativeHost =
      object : DefaultReactNativeHost(this) {
        override fun getPackages(): List<ReactPackage> {
          return PackageList(this).packages
        }
      }
}
"#;

    fn r_package() -> PackageId {
        PackageId::parse("com.acme.app").unwrap()
    }

    fn patched(language: Language, contents: &str) -> Patched {
        let templates = Templates::new().unwrap();
        match patch(&templates, language, contents, &r_package()).unwrap() {
            Outcome::Patched(patched) => patched,
            other => panic!("expected a patch, got {:?}", other),
        }
    }

    #[test]
    fn java_legacy() {
        let patched = patched(Language::Java, JAVA_LEGACY);
        assert_eq!(patched.layout, Layout::Legacy);
        assert_eq!(patched.lifecycle, Lifecycle::Injected);
        let contents = &patched.contents;
        assert!(contents.contains("new MainReactPackage(), new SmiSdkReactPackage()"));
        assert!(contents.contains(
            "import com.datami.smi.internal.MessagingType;\nimport android.app.Application;"
        ));
        assert!(contents.contains("implements SdStateChangeListener, ReactApplication {"));
        assert!(contents.contains(
            "        super.onCreate();\n        boolean dmiUserMessaging = getResources()"
        ));
        assert!(contents.contains(
            "    @Override\n    public void onChange(SmiResult smiResult) {\n        SmiSdkReactModule.setSmiResultToModule(smiResult);\n    }\n}\n"
        ));
        assert_eq!(contents.matches("onCreate()").count(), 2);
        assert!(!contents.contains("import com.acme.app.R;"));
        balance::check(contents).unwrap();
    }

    #[test]
    fn java_062_imports_arrays_and_r() {
        let patched = patched(Language::Java, JAVA_062);
        assert_eq!(patched.layout, Layout::PackagesAdd);
        assert_eq!(patched.lifecycle, Lifecycle::Synthesized);
        let contents = &patched.contents;
        assert!(contents.contains(
            "          packages.add(new SmiSdkReactPackage());\n          return packages;"
        ));
        assert!(contents.contains("import java.util.Arrays;\nimport com.datami.smi.SdStateChangeListener;"));
        assert!(contents.contains("import com.acme.app.R;\nimport android.app.Application;"));
        assert!(contents.contains(
            "  @Override\n  public void onCreate() {\n    super.onCreate();\n    boolean dmiUserMessaging"
        ));
        let on_create = contents.find("public void onCreate()").unwrap();
        let on_change = contents.find("public void onChange(").unwrap();
        assert!(on_create < on_change);
        balance::check(contents).unwrap();
    }

    #[test]
    fn kotlin_legacy() {
        let patched = patched(Language::Kotlin, KOTLIN_LEGACY);
        assert_eq!(patched.layout, Layout::Legacy);
        assert_eq!(patched.lifecycle, Lifecycle::Synthesized);
        let contents = &patched.contents;
        assert!(contents.contains("          MainReactPackage(), SmiSdkReactPackage()\n"));
        assert!(contents.contains(
            "import com.datami.smi.internal.MessagingType\nimport android.app.Application\n"
        ));
        assert!(contents.contains("class MainApplication : Application(), SdStateChangeListener, ReactApplication {"));
        assert!(contents.contains(
            "  override fun onCreate() {\n    super.onCreate()\n    val dmiUserMessaging"
        ));
        assert!(contents.contains("  override fun onChange(smiResult: SmiResult) {\n"));
        let on_create = contents.find("override fun onCreate()").unwrap();
        let on_change = contents.find("override fun onChange(").unwrap();
        assert!(on_create < on_change);
        assert!(!contents.contains("new "));
        assert!(!contents.contains(';'));
        balance::check(contents).unwrap();
    }

    #[test]
    fn r_is_imported_from_its_own_package() {
        let templates = Templates::new().unwrap();
        let namespace = PackageId::parse("com.acme.app.core").unwrap();
        let contents = match patch(&templates, Language::Kotlin, KOTLIN_074, &namespace).unwrap() {
            Outcome::Patched(patched) => patched.contents,
            other => panic!("expected a patch, got {:?}", other),
        };
        assert!(contents.contains("import com.datami.smi.internal.MessagingType\nimport com.acme.app.core.R\n"));
        assert!(!contents.contains("import com.acme.app.R"));
    }

    #[test]
    fn kotlin_074() {
        let patched = patched(Language::Kotlin, KOTLIN_074);
        assert_eq!(patched.layout, Layout::PackageListApply);
        assert_eq!(patched.lifecycle, Lifecycle::Injected);
        let contents = &patched.contents;
        assert!(contents.contains(
            "PackageList(this).packages.apply {\n              add(SmiSdkReactPackage())\n              // add(MyReactNativePackage())"
        ));
        assert!(contents.contains("class MainApplication : Application(), SdStateChangeListener, ReactApplication {"));
        assert!(contents.contains("    super.onCreate()\n    val dmiUserMessaging"));
        assert!(contents.contains("    var dmiMessaging = MessagingType.NONE\n"));
        assert!(contents.contains("  override fun onChange(smiResult: SmiResult) {\n"));
        assert!(!contents.contains(';'));
        balance::check(contents).unwrap();
    }

    #[test]
    fn kotlin_073_return_becomes_apply() {
        let patched = patched(Language::Kotlin, KOTLIN_073);
        assert_eq!(patched.layout, Layout::PackageListReturn);
        assert_eq!(patched.lifecycle, Lifecycle::Synthesized);
        assert!(patched.contents.contains(
            "          return PackageList(this).packages.apply {\n            add(SmiSdkReactPackage())\n          }\n"
        ));
        assert!(patched.contents.contains("  override fun onCreate() {\n    super.onCreate()\n"));
        balance::check(&patched.contents).unwrap();
    }

    #[test]
    fn second_patch_is_skipped() {
        let templates = Templates::new().unwrap();
        let once = patched(Language::Java, JAVA_LEGACY);
        assert!(matches!(
            patch(&templates, Language::Java, &once.contents, &r_package()).unwrap(),
            Outcome::AlreadyApplied
        ));
    }

    #[test]
    fn unknown_layout_is_left_alone() {
        let templates = Templates::new().unwrap();
        let contents = "package com.acme.app;\n\npublic class MainApplication extends Application implements ReactApplication {\n}\n";
        assert!(matches!(
            patch(&templates, Language::Java, contents, &r_package()).unwrap(),
            Outcome::AnchorNotMatched { anchor: "package list" }
        ));
    }

    #[test]
    fn file_without_imports_gets_them_after_package() {
        let contents = "package com.acme.app;\n\npublic class MainApplication extends Application implements ReactApplication {\n    List<ReactPackage> getPackages() {\n        return Arrays.asList(new MainReactPackage());\n    }\n}\n";
        let patched = patched(Language::Java, contents);
        assert!(patched
            .contents
            .starts_with("package com.acme.app;\n\nimport com.datami.smi.SdStateChangeListener;"));
        assert!(patched
            .contents
            .contains("import com.datami.smi.internal.MessagingType;\n\npublic class"));
    }
}
