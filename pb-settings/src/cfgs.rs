//! Configs that tune the build setting engine, and a single place to register all of them.

use pb_cfg::{Config, ConfigSet, ConfigSetBuilder};

pub static STRING_LIST_DELIMITER: Config<&'static str> = Config::new(
    "string_list_delimiter",
    "Delimiter that separates the items of a string_list value. Must not be empty.",
    ",",
);

pub static ALLOW_BOOL_NEGATION: Config<bool> = Config::new(
    "allow_bool_negation",
    "Whether `--no<flag>` sets a bool flag to false.",
    true,
);

pub static FLAG_PREFIX: Config<&'static str> = Config::new(
    "flag_prefix",
    "Prefix that marks an argument on the command line as a flag.",
    "--",
);

/// Register every [`Config`] of the engine with `builder`.
pub fn all_cfgs(builder: &mut ConfigSetBuilder) {
    builder
        .register(&STRING_LIST_DELIMITER)
        .register(&ALLOW_BOOL_NEGATION)
        .register(&FLAG_PREFIX)
        .register(&crate::defs::SETTINGS_FILENAME);
}

/// A [`ConfigSet`] with every engine config at its default.
pub fn default_configs() -> ConfigSet {
    let mut builder = ConfigSet::builder();
    all_cfgs(&mut builder);
    builder.build()
}
