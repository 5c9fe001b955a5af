use serde::Serialize;
use serde_json::{json, Value};

use super::MockChainQuerier;
use crate::constants::COLLATERALS_NAMESPACE;
use crate::oracle::OracleQueryMsg;
use crate::redbank::{CollateralKey, RedBankQueryMsg, UserKey};
use crate::types::{Position, PositionKind, UserCollateral, UserDebt};

pub fn debt(denom: &str, amount: &str) -> UserDebt {
    UserDebt {
        denom: denom.to_string(),
        amount: amount.to_string(),
        amount_scaled: amount.to_string(),
        uncollateralized: false,
    }
}

pub fn collateral(denom: &str, amount: &str) -> UserCollateral {
    UserCollateral {
        denom: denom.to_string(),
        amount: amount.to_string(),
        amount_scaled: amount.to_string(),
        enabled: true,
    }
}

/// `colls` 맵 키 (acc_id 는 빈 문자열)
pub fn collateral_key(addr: &str, denom: &str) -> Vec<u8> {
    let key = CollateralKey {
        user: UserKey {
            addr: addr.to_string(),
            acc_id: Some(String::new()),
        },
        denom: denom.to_string(),
    };

    key.encode(COLLATERALS_NAMESPACE).unwrap_or_default()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl MockChainQuerier {
    /// 오라클에 pyth 가격 소스를 가진 자산을 등록한다
    pub fn with_asset(self, oracle: &str, denom: &str, price: &str, decimals: u32) -> Self {
        let price_msg = OracleQueryMsg::Price {
            denom: denom.to_string(),
        };
        let source_msg = OracleQueryMsg::PriceSource {
            denom: denom.to_string(),
        };

        self.with_smart_response(
            oracle,
            to_json(&price_msg),
            json!({"denom": denom, "price": price}),
        )
        .with_smart_response(
            oracle,
            to_json(&source_msg),
            json!({
                "denom": denom,
                "price_source": {
                    "pyth": {
                        "contract_addr": "osmo13ge29x4e2s63a8ytz2px8gurtyznmue4a69n5275692v3qn3ks8q7cwck7",
                        "denom_decimals": decimals,
                        "max_staleness": 60
                    }
                }
            }),
        )
    }

    pub fn with_user_debts(self, redbank: &str, user: &str, debts: &[UserDebt], limit: u32) -> Self {
        self.with_position_pages(redbank, user, PositionKind::Debt, debts, limit)
    }

    pub fn with_user_collaterals(
        self,
        redbank: &str,
        user: &str,
        collaterals: &[UserCollateral],
        limit: u32,
    ) -> Self {
        self.with_position_pages(redbank, user, PositionKind::Collateral, collaterals, limit)
    }

    /// `limit` 개씩 잘라 `start_after` 체인으로 등록하고 마지막에 빈 페이지를 둔다
    fn with_position_pages<P: Position + Serialize>(
        mut self,
        redbank: &str,
        user: &str,
        kind: PositionKind,
        positions: &[P],
        limit: u32,
    ) -> Self {
        let mut start_after: Option<String> = None;

        for chunk in positions.chunks(limit.max(1) as usize) {
            let msg = RedBankQueryMsg::page(kind, user, start_after.clone(), limit);
            self = self.with_smart_response(redbank, to_json(&msg), to_json(chunk));
            start_after = chunk.last().map(|p| p.denom().to_string());
        }

        let msg = RedBankQueryMsg::page(kind, user, start_after, limit);
        self.with_smart_response(redbank, to_json(&msg), json!([]))
    }
}
