use bonfig::prelude::*;
use bonfig::store::StoreError;
use bonfig::{FieldPath, Key};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

#[derive(Bonfig)]
#[bonfig(store = "d")]
struct Base {
    #[bonfig(default = "foo")]
    a: Field<String>,
    #[bonfig(section = ["Output"], default = 1234)]
    pin: Field<i64>,
    #[bonfig(section = ["Output"], name = "B")]
    b: Field<String>,
}

#[derive(Bonfig)]
#[bonfig(store = "d", name = "Extended")]
struct Extended {
    #[bonfig(extends)]
    base: Base,
    #[bonfig(section = ["lists"], separator = ", ")]
    even: Field<Vec<String>>,
    #[bonfig(
        format = "%Y-%m-%d %H:%M",
        default = NaiveDate::from_ymd_opt(2020, 1, 2)
            .and_then(|date| date.and_hms_opt(3, 4, 0))
            .expect("valid timestamp")
    )]
    stamp: Field<NaiveDateTime>,
    #[bonfig(store = "environ", name = "BONFIG_HOME")]
    home: Field<String>,
    #[bonfig(section = ["Limits", "Http"], default = 8080)]
    port: Field<u16>,
}

#[derive(Bonfig)]
#[bonfig(store = "ini")]
struct Flags {
    #[bonfig(section = "Flags", name = "Verbose")]
    verbose: Field<bool>,
    #[bonfig(section = "Flags")]
    quiet: Field<bool>,
    #[bonfig(section = "Flags", default = 3)]
    retries: Field<u8>,
}

fn load_extended() -> anyhow::Result<(Config, Extended)> {
    let (schema, fields) = Extended::schema()?;
    let cfg = Config::builder(schema)
        .locked(false)
        .load(|stores: &mut Stores| -> anyhow::Result<()> {
            stores.insert(
                "d",
                MemoryStore::from_value(json!({"Output": {"B": "bee"}, "lists": {"even": "2, 4"}}))?,
            )?;
            stores.insert("environ", EnvStore::from_vars([("BONFIG_HOME", "/srv/bonfig")]))?;
            Ok(())
        })?;
    Ok((cfg, fields))
}

#[test]
fn derive_infers_names_from_members() -> anyhow::Result<()> {
    let (schema, fields) = Base::schema()?;

    assert_eq!(schema.name(), "Base");
    assert_eq!(fields.a.path().to_string(), "a");
    assert_eq!(fields.pin.path().to_string(), "Output/pin");
    assert_eq!(fields.b.path().to_string(), "Output/B");
    assert_eq!(schema.fields().len(), 3);
    Ok(())
}

#[test]
fn derived_schema_reads_every_store() -> anyhow::Result<()> {
    let (cfg, f) = load_extended()?;

    assert_eq!(cfg.schema().name(), "Extended");
    assert_eq!(cfg.get(&f.base.a)?, "foo");
    assert_eq!(cfg.get(&f.base.pin)?, 1234);
    assert_eq!(cfg.get(&f.base.b)?, "bee");
    assert_eq!(cfg.get(&f.even)?, ["2", "4"]);
    assert_eq!(cfg.get(&f.home)?, "/srv/bonfig");
    assert_eq!(cfg.get(&f.port)?, 8080);

    let stamp = cfg.get(&f.stamp)?;
    assert_eq!(stamp.to_string(), "2020-01-02 03:04:00");
    assert_eq!(
        cfg.get_dyn("d", &FieldPath::new(["stamp"])?)?,
        json!("2020-01-02 03:04")
    );
    Ok(())
}

#[test]
fn derived_fields_write_through_codecs() -> anyhow::Result<()> {
    let (mut cfg, f) = load_extended()?;

    cfg.set(&f.even, vec!["6".to_owned(), "8".to_owned()])?;
    cfg.set(&f.home, "/opt/bonfig".to_owned())?;
    let when = NaiveDate::from_ymd_opt(2024, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 0))
        .expect("valid timestamp");
    cfg.set(&f.stamp, when)?;

    let snapshot = cfg.snapshot();
    assert_eq!(snapshot["d"]["lists"]["even"], json!("6, 8"));
    assert_eq!(snapshot["d"]["stamp"], json!("2024-12-31 23:59"));
    assert_eq!(snapshot["environ"]["BONFIG_HOME"], json!("/opt/bonfig"));
    assert_eq!(cfg.get(&f.stamp)?, when);
    Ok(())
}

#[test]
fn sectioned_store_uses_documented_bool_spellings() -> anyhow::Result<()> {
    let (schema, f) = Flags::schema()?;
    let flags = Key::new("Flags")?;
    let mut cfg = Config::builder(schema)
        .locked(false)
        .load(|stores: &mut Stores| -> anyhow::Result<()> {
            let ini = SectionedStore::new().with_option(&flags, &Key::new("VERBOSE")?, "Yes");
            stores.insert("ini", ini)?;
            Ok(())
        })?;

    assert!(cfg.get(&f.verbose)?);
    assert_eq!(cfg.get(&f.retries)?, 3);
    assert!(matches!(cfg.get(&f.quiet), Err(ConfigError::KeyNotFound { .. })));

    cfg.set(&f.quiet, false)?;
    cfg.set(&f.verbose, true)?;
    assert_eq!(
        cfg.snapshot(),
        json!({"ini": {"Flags": {"verbose": "True", "quiet": "False", "retries": "3"}}})
    );
    assert!(!cfg.get(&f.quiet)?);

    let store = cfg.store_mut("ini")?;
    store.assign(&FieldPath::new(["Flags", "quiet"])?, json!("maybe"))?;
    assert!(matches!(cfg.get(&f.quiet), Err(ConfigError::Codec { .. })));
    Ok(())
}

#[test]
fn string_only_stores_reject_nested_paths() -> anyhow::Result<()> {
    let mut builder = Schema::builder("Env");
    let env = builder.store("environ")?;
    let nested = builder.add(env.section("Deep")?.text("value")?)?;
    let cfg = Config::load(builder.build(), |stores: &mut Stores| -> anyhow::Result<()> {
        stores.insert("environ", EnvStore::from_vars([("value", "x")]))?;
        Ok(())
    })?;

    let err = cfg.get(&nested).expect_err("env store is flat");
    assert!(matches!(
        err,
        ConfigError::Store {
            source: StoreError::UnsupportedPath { .. },
            ..
        }
    ));
    Ok(())
}

#[test]
fn sectioned_fields_need_a_section() -> anyhow::Result<()> {
    let mut builder = Schema::builder("Flat");
    let ini = builder.store("ini")?;
    let output = ini.section("Output")?;
    let top = builder.add(ini.text("Output")?)?;
    let cfg = Config::load(builder.build(), |stores: &mut Stores| -> anyhow::Result<()> {
        let store = SectionedStore::new().with_option(&Key::new("Output")?, &Key::new("a")?, "foo");
        stores.insert("ini", store)?;
        Ok(())
    })?;

    assert!(matches!(
        cfg.get(&top),
        Err(ConfigError::Store {
            source: StoreError::UnsupportedPath { .. },
            ..
        })
    ));
    assert_eq!(cfg.section(&output)?, json!({"a": "foo"}));
    Ok(())
}

#[test]
fn loader_must_fill_every_store() -> anyhow::Result<()> {
    let (schema, _) = Extended::schema()?;
    let err = Config::load(schema, |stores: &mut Stores| -> anyhow::Result<()> {
        stores.insert("d", MemoryStore::new())?;
        Ok(())
    })
    .expect_err("environ missing");
    assert!(matches!(err, ConfigError::MissingStore { ref store, .. } if store.as_str() == "environ"));

    let (schema, _) = Base::schema()?;
    let err = Config::load(schema, |stores: &mut Stores| -> anyhow::Result<()> {
        stores.insert("elsewhere", MemoryStore::new())?;
        Ok(())
    })
    .expect_err("undeclared store");
    assert!(matches!(err, ConfigError::Load { .. }));
    Ok(())
}
