use cosmwasm_std::{
    coins, Addr, BankMsg, DepsMut, Env, Event, MessageInfo, QuerierWrapper, Response, StdResult,
    Storage, Uint128,
};

use crate::error::ContractError;
use crate::state::{ClientAccount, Config, Request, BEACONS, CLIENT_ACCOUNTS, CONFIG};

/// Validate that exactly one coin of the configured denom was sent.
pub fn must_pay(info: &MessageInfo, denom: &str) -> Result<Uint128, ContractError> {
    if info.funds.is_empty() {
        return Err(ContractError::NoFundsSent);
    }
    if info.funds.len() != 1 || info.funds[0].denom != denom {
        return Err(ContractError::WrongDenom {
            expected: denom.to_string(),
            denom: info
                .funds
                .iter()
                .map(|c| c.denom.as_str())
                .collect::<Vec<_>>()
                .join(","),
        });
    }
    if info.funds[0].amount.is_zero() {
        return Err(ContractError::NoFundsSent);
    }
    Ok(info.funds[0].amount)
}

/// Deposit funds into a client account (the sender's unless `client` is given).
pub fn deposit(
    deps: DepsMut,
    info: MessageInfo,
    client: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let amount = must_pay(&info, &config.denom)?;

    let client = match client {
        Some(addr) => deps.api.addr_validate(&addr)?,
        None => info.sender.clone(),
    };

    let mut account = CLIENT_ACCOUNTS
        .may_load(deps.storage, &client)?
        .unwrap_or_default();
    account.balance += amount;
    CLIENT_ACCOUNTS.save(deps.storage, &client, &account)?;

    Ok(Response::new()
        .add_attribute("action", "deposit")
        .add_attribute("client", client.to_string())
        .add_attribute("amount", amount.to_string())
        .add_attribute("balance", account.balance.to_string()))
}

/// Withdraw unreserved balance from the sender's client account.
pub fn withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    let mut account = CLIENT_ACCOUNTS
        .may_load(deps.storage, &info.sender)?
        .unwrap_or_default();
    let available = account.available();
    if amount.is_zero() || amount > available {
        return Err(ContractError::WithdrawingTooMuch {
            requested: amount,
            available,
        });
    }

    account.balance -= amount;
    CLIENT_ACCOUNTS.save(deps.storage, &info.sender, &account)?;

    let send_msg = bank_send(deps.querier, &env, &config, &info.sender, amount)?;

    Ok(Response::new()
        .add_message(send_msg)
        .add_attribute("action", "withdraw")
        .add_attribute("client", info.sender.to_string())
        .add_attribute("amount", amount.to_string()))
}

/// Build a payout, refusing amounts the contract does not hold.
pub(crate) fn bank_send(
    querier: QuerierWrapper,
    env: &Env,
    config: &Config,
    to: &Addr,
    amount: Uint128,
) -> Result<BankMsg, ContractError> {
    let balance = querier
        .query_balance(&env.contract.address, &config.denom)?
        .amount;
    if amount > balance {
        return Err(ContractError::FailedToSend { amount, balance });
    }
    Ok(BankMsg::Send {
        to_address: to.to_string(),
        amount: coins(amount.u128(), &config.denom),
    })
}

/// Deposit a client must hold, unreserved, to open a request.
pub fn reservation(config: &Config, callback_gas_limit: u64, optimistic: bool) -> Uint128 {
    let per_beacon = config.gas_cost(config.gas.submit) + config.beacon_fee;
    let finalize = config.gas_cost(config.gas.finalize + callback_gas_limit);
    let mut total = per_beacon * Uint128::new(3) + finalize;
    if optimistic {
        total += config.gas_cost(config.gas.complete);
    }
    total
}

/// Lock `amount` of the client's balance for a new request.
pub(crate) fn reserve(
    storage: &mut dyn Storage,
    client: &Addr,
    amount: Uint128,
) -> Result<(), ContractError> {
    let mut account = CLIENT_ACCOUNTS.may_load(storage, client)?.unwrap_or_default();
    let available = account.available();
    if available < amount {
        return Err(ContractError::DepositTooLow {
            available,
            required: amount,
        });
    }
    account.reserved += amount;
    CLIENT_ACCOUNTS.save(storage, client, &account)?;
    Ok(())
}

/// Unlock whatever is left of a request's reservation.
pub(crate) fn release_reservation(
    storage: &mut dyn Storage,
    request: &mut Request,
) -> StdResult<()> {
    if request.reserved_remaining.is_zero() {
        return Ok(());
    }
    let client = &request.data.client;
    let mut account = CLIENT_ACCOUNTS.may_load(storage, client)?.unwrap_or_default();
    account.reserved = account.reserved.saturating_sub(request.reserved_remaining);
    CLIENT_ACCOUNTS.save(storage, client, &account)?;
    request.reserved_remaining = Uint128::zero();
    Ok(())
}

/// Move `amount` from the request's client to `to`.
///
/// The client pays what it can; the treasury covers the shortfall up to its
/// own balance. Never fails for lack of funds.
pub(crate) fn charge(
    storage: &mut dyn Storage,
    config: &Config,
    request: &mut Request,
    to: &Addr,
    amount: Uint128,
) -> StdResult<Vec<Event>> {
    let mut events = vec![];
    if amount.is_zero() {
        return Ok(events);
    }

    let client = request.data.client.clone();
    let mut account = CLIENT_ACCOUNTS.may_load(storage, &client)?.unwrap_or_default();
    let from_client = amount.min(account.balance);
    let released = from_client.min(request.reserved_remaining);
    account.balance -= from_client;
    account.reserved = account.reserved.saturating_sub(released);
    request.reserved_remaining -= released;
    CLIENT_ACCOUNTS.save(storage, &client, &account)?;

    if !from_client.is_zero() {
        credit(storage, to, from_client)?;
        events.push(charge_event(&client, to, from_client));
    }

    let shortfall = amount - from_client;
    if !shortfall.is_zero() && config.treasury != client {
        let mut treasury = CLIENT_ACCOUNTS
            .may_load(storage, &config.treasury)?
            .unwrap_or_default();
        let covered = shortfall.min(treasury.balance);
        if !covered.is_zero() {
            treasury.balance -= covered;
            CLIENT_ACCOUNTS.save(storage, &config.treasury, &treasury)?;
            credit(storage, to, covered)?;
            events.push(charge_event(&config.treasury, to, covered));
        }
    }

    Ok(events)
}

/// Credit a beacon's stake, or the account's client balance for non-beacons.
pub(crate) fn credit(storage: &mut dyn Storage, to: &Addr, amount: Uint128) -> StdResult<()> {
    if amount.is_zero() {
        return Ok(());
    }
    if let Some(mut beacon) = BEACONS.may_load(storage, to)? {
        beacon.staked += amount;
        return BEACONS.save(storage, to, &beacon);
    }
    credit_client(storage, to, amount)
}

pub(crate) fn credit_client(
    storage: &mut dyn Storage,
    client: &Addr,
    amount: Uint128,
) -> StdResult<()> {
    if amount.is_zero() {
        return Ok(());
    }
    CLIENT_ACCOUNTS.update(storage, client, |account| -> StdResult<_> {
        let mut account: ClientAccount = account.unwrap_or_default();
        account.balance += amount;
        Ok(account)
    })?;
    Ok(())
}

fn charge_event(from: &Addr, to: &Addr, amount: Uint128) -> Event {
    Event::new("randbeacon_charge")
        .add_attribute("from", from.to_string())
        .add_attribute("to", to.to_string())
        .add_attribute("amount", amount.to_string())
}
