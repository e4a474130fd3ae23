use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const BASE_URL_KEY: &str =
  "api.base_url";
pub const TIMEOUT_KEY: &str =
  "api.timeout.secs";
pub const AUTH_CATALOG_KEY: &str =
  "api.auth.catalog";
pub const DATA_LOCATION_KEY: &str =
  "data.location";

const DEFAULT_BASE_URL: &str =
  "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    cfg.map.insert(
      DATA_LOCATION_KEY.to_string(),
      "~/.causeway".to_string()
    );
    cfg.map.insert(
      BASE_URL_KEY.to_string(),
      DEFAULT_BASE_URL.to_string()
    );
    cfg.map.insert(
      TIMEOUT_KEY.to_string(),
      DEFAULT_TIMEOUT_SECS.to_string()
    );
    cfg.map.insert(
      AUTH_CATALOG_KEY.to_string(),
      "off".to_string()
    );
    cfg.map.insert(
      "color".to_string(),
      "on".to_string()
    );
    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading causewayrc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no causewayrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn base_url(&self) -> String {
    self
      .get(BASE_URL_KEY)
      .unwrap_or_else(|| {
        DEFAULT_BASE_URL.to_string()
      })
  }

  pub fn request_timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let raw = self
      .get(TIMEOUT_KEY)
      .unwrap_or_else(|| {
        DEFAULT_TIMEOUT_SECS
          .to_string()
      });
    let secs = raw
      .trim()
      .parse::<u64>()
      .with_context(|| {
        format!(
          "invalid {TIMEOUT_KEY}: \
           {raw}"
        )
      })?;
    if secs == 0 {
      return Err(anyhow!(
        "{TIMEOUT_KEY} must be at \
         least 1 second"
      ));
    }
    Ok(Duration::from_secs(secs))
  }

  pub fn authenticated_catalog(
    &self
  ) -> bool {
    self
      .get_bool(AUTH_CATALOG_KEY)
      .unwrap_or(false)
  }

  /// Read one rc file, following
  /// `include` lines depth first.
  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
    self
      .loaded_files
      .push(path.clone());

    let origin = path
      .parent()
      .unwrap_or(Path::new("."));

    for (idx, raw) in
      text.lines().enumerate()
    {
      let at = || {
        format!(
          "{}:{}",
          path.display(),
          idx + 1
        )
      };

      match RcLine::classify(raw) {
        | RcLine::Skip => {}
        | RcLine::Include(target) => {
          let target = resolve_include_path(
            origin, target
          )
          .with_context(at)?;
          if !target.is_file() {
            warn!(at = %at(), include = %target.display(), "skipping missing include");
            continue;
          }
          debug!(at = %at(), include = %target.display(), "following include");
          self.load_file(&target)?;
        }
        | RcLine::Setting(key, value) => {
          trace!(%key, %value, "rc setting");
          self.map.insert(
            key.to_string(),
            value.to_string()
          );
        }
        | RcLine::Invalid => {
          return Err(anyhow!(
            "invalid config line \
             {}: {}",
            at(),
            raw.trim()
          ));
        }
      }
    }

    Ok(())
  }
}

/// One line of an rc file after
/// comments are stripped.
#[derive(Debug, PartialEq, Eq)]
enum RcLine<'a> {
  Skip,
  Include(&'a str),
  Setting(&'a str, &'a str),
  Invalid
}

impl<'a> RcLine<'a> {
  fn classify(raw: &'a str) -> Self {
    let content = raw
      .split_once('#')
      .map_or(raw, |(kept, _)| kept)
      .trim();

    if content.is_empty() {
      return RcLine::Skip;
    }
    if let Some(target) =
      content.strip_prefix("include ")
    {
      return RcLine::Include(
        target.trim()
      );
    }
    match content.split_once('=') {
      | Some((key, value))
        if !key.trim().is_empty() =>
      {
        RcLine::Setting(
          key.trim(),
          value.trim()
        )
      }
      | _ => RcLine::Invalid
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get(DATA_LOCATION_KEY)
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

const RC_ENV: &str = "CAUSEWAYRC";
const RC_FILE_NAME: &str =
  ".causewayrc";

/// Where the rc file comes from, in
/// priority order: `--rc-file`, the
/// `CAUSEWAYRC` variable (`/dev/null`
/// disables it), then `~/.causewayrc`
/// when present.
#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  let explicit = override_path
    .map(Path::to_path_buf)
    .or_else(|| {
      std::env::var_os(RC_ENV)
        .map(PathBuf::from)
    });

  match explicit {
    | Some(path)
      if path
        == Path::new("/dev/null") =>
    {
      debug!("rc file disabled");
      Ok(None)
    }
    | Some(path) => Ok(Some(path)),
    | None => {
      let fallback =
        home_dir()?.join(RC_FILE_NAME);
      Ok(
        fallback
          .is_file()
          .then_some(fallback)
      )
    }
  }
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  Ok(home_dir()?.join(".causeway"))
}

fn home_dir() -> anyhow::Result<PathBuf>
{
  dirs::home_dir().context(
    "cannot determine home directory"
  )
}

fn resolve_include_path(
  origin: &Path,
  target: &str
) -> anyhow::Result<PathBuf> {
  if target.is_empty() {
    return Err(anyhow!(
      "include needs a path"
    ));
  }
  let target =
    expand_tilde(Path::new(target));
  Ok(if target.is_absolute() {
    target
  } else {
    origin.join(target)
  })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn rc_file_with_include_and_overrides()
  {
    let temp =
      tempdir().expect("tempdir");
    let extra =
      temp.path().join("extra.rc");
    fs::write(
      &extra,
      "api.timeout.secs = 30\n"
    )
    .expect("write include");
    let rc =
      temp.path().join("causewayrc");
    fs::write(
      &rc,
      "# staging\napi.base_url = \
       https://staging.example.org \
       # trailing\ninclude \
       extra.rc\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(rc.as_path()))
      .expect("load config");
    assert_eq!(
      cfg.base_url(),
      "https://staging.example.org"
    );
    assert_eq!(
      cfg
        .request_timeout()
        .expect("timeout"),
      Duration::from_secs(30)
    );
    assert_eq!(cfg.loaded_files.len(), 2);

    cfg.apply_overrides(vec![(
      "rc.api.auth.catalog"
        .to_string(),
      "yes".to_string()
    )]);
    assert!(cfg.authenticated_catalog());
  }

  #[test]
  fn zero_timeout_is_rejected() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      TIMEOUT_KEY.to_string(),
      "0".to_string()
    )]);
    assert!(
      cfg.request_timeout().is_err()
    );
  }

  #[test]
  fn rc_lines_are_classified() {
    assert_eq!(
      RcLine::classify("   # note"),
      RcLine::Skip
    );
    assert_eq!(
      RcLine::classify(
        "include  ~/shared.rc # x"
      ),
      RcLine::Include("~/shared.rc")
    );
    assert_eq!(
      RcLine::classify(
        " color = off "
      ),
      RcLine::Setting("color", "off")
    );
    assert_eq!(
      RcLine::classify("= orphan"),
      RcLine::Invalid
    );
  }

  #[test]
  fn explicit_rc_path_wins_and_dev_null_disables()
  {
    let temp =
      tempdir().expect("tempdir");
    let rc = temp.path().join("rc");
    assert_eq!(
      resolve_rc_path(Some(rc.as_path()))
        .expect("resolve"),
      Some(rc.clone())
    );
    assert_eq!(
      resolve_rc_path(Some(Path::new(
        "/dev/null"
      )))
      .expect("resolve"),
      None
    );
  }

  #[test]
  fn malformed_line_reports_location() {
    let temp =
      tempdir().expect("tempdir");
    let rc =
      temp.path().join("causewayrc");
    fs::write(&rc, "not a pair\n")
      .expect("write rc");

    let err = Config::load(Some(rc.as_path()))
      .expect_err("should fail");
    assert!(
      err
        .to_string()
        .contains(":1:")
    );
  }
}
