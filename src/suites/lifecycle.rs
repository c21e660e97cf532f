//! `wifi_init`, `wifi_initWithConfig`, `wifi_uninit`

use crate::executor::expect_status;
use crate::hal::api::{WIFI_INIT, WIFI_INIT_WITH_CONFIG, WIFI_UNINIT};
use crate::hal::{HalConfig, HalStatus};
use crate::models::TestCase;

pub(crate) fn noinit_cases() -> Vec<TestCase> {
    vec![
        TestCase::positive("wifi_init_positive", WIFI_INIT, "initializes the HAL", |ctx| {
            expect_status(WIFI_INIT, ctx.init(), HalStatus::Ok)?;
            expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)
        }),
        TestCase::negative(
            "wifi_init_twice",
            WIFI_INIT,
            "second wifi_init without wifi_uninit is rejected",
            |ctx| {
                expect_status(WIFI_INIT, ctx.init(), HalStatus::Ok)?;
                expect_status(WIFI_INIT, ctx.init(), HalStatus::Err)?;
                expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)
            },
        ),
        TestCase::positive(
            "wifi_initWithConfig_positive",
            WIFI_INIT_WITH_CONFIG,
            "initializes the HAL on the configured interface",
            |ctx| {
                let config = ctx.fixture_config()?;
                expect_status(
                    WIFI_INIT_WITH_CONFIG,
                    ctx.init_with_config(Some(&config)),
                    HalStatus::Ok,
                )?;
                expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)
            },
        ),
        TestCase::negative(
            "wifi_initWithConfig_null_config",
            WIFI_INIT_WITH_CONFIG,
            "rejects a NULL config",
            |ctx| expect_status(WIFI_INIT_WITH_CONFIG, ctx.init_with_config(None), HalStatus::Err),
        ),
        TestCase::negative(
            "wifi_initWithConfig_empty_interface",
            WIFI_INIT_WITH_CONFIG,
            "rejects an empty interface name",
            |ctx| {
                let config = HalConfig::new("");
                expect_status(
                    WIFI_INIT_WITH_CONFIG,
                    ctx.init_with_config(Some(&config)),
                    HalStatus::Err,
                )
            },
        ),
        TestCase::negative(
            "wifi_initWithConfig_after_init",
            WIFI_INIT_WITH_CONFIG,
            "rejected once wifi_init has succeeded",
            |ctx| {
                let config = ctx.fixture_config()?;
                expect_status(WIFI_INIT, ctx.init(), HalStatus::Ok)?;
                expect_status(
                    WIFI_INIT_WITH_CONFIG,
                    ctx.init_with_config(Some(&config)),
                    HalStatus::Err,
                )?;
                expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)
            },
        ),
        TestCase::positive("wifi_uninit_positive", WIFI_UNINIT, "uninitializes the HAL", |ctx| {
            expect_status(WIFI_INIT, ctx.init(), HalStatus::Ok)?;
            expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)
        }),
        TestCase::negative(
            "wifi_uninit_without_init",
            WIFI_UNINIT,
            "rejected when the HAL was never initialized",
            |ctx| expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Err),
        ),
        TestCase::negative(
            "wifi_uninit_twice",
            WIFI_UNINIT,
            "second wifi_uninit is rejected",
            |ctx| {
                expect_status(WIFI_INIT, ctx.init(), HalStatus::Ok)?;
                expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)?;
                expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Err)
            },
        ),
    ]
}

fn reinit_case() -> TestCase {
    TestCase::positive(
        "wifi_uninit_reinit",
        WIFI_UNINIT,
        "the HAL can be initialized again after wifi_uninit",
        |ctx| {
            expect_status(WIFI_UNINIT, ctx.uninit(), HalStatus::Ok)?;
            ctx.restore_precondition()
        },
    )
}

fn init_while_initialized_case() -> TestCase {
    TestCase::negative(
        "wifi_init_while_initialized",
        WIFI_INIT,
        "rejected while the HAL is initialized",
        |ctx| expect_status(WIFI_INIT, ctx.init(), HalStatus::Err),
    )
}

fn init_with_config_while_initialized_case() -> TestCase {
    TestCase::negative(
        "wifi_initWithConfig_while_initialized",
        WIFI_INIT_WITH_CONFIG,
        "rejected while the HAL is initialized",
        |ctx| {
            let config = ctx.fixture_config()?;
            expect_status(
                WIFI_INIT_WITH_CONFIG,
                ctx.init_with_config(Some(&config)),
                HalStatus::Err,
            )
        },
    )
}

/// Cases for suites whose setup leaves the HAL initialized
pub(crate) fn initialized_cases() -> Vec<TestCase> {
    vec![
        init_while_initialized_case(),
        init_with_config_while_initialized_case(),
        reinit_case(),
    ]
}
