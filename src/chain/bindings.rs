//! Contract interfaces consumed by the chain adapter.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IMockStablecoin {
        function mint(address to, uint256 amount) external;
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface ICrowdfundingPlatform {
        event CampaignCreated(
            uint256 indexed campaignId,
            address indexed creator,
            uint256 goal,
            uint256 deadline
        );
        event ContributionMade(
            uint256 indexed campaignId,
            address indexed contributor,
            uint256 amount
        );
        event FundsClaimed(
            uint256 indexed campaignId,
            address indexed creator,
            uint256 amount
        );

        function createCampaign(uint256 goal, uint256 duration) external returns (uint256);
        function contribute(uint256 campaignId, uint256 amount) external;
        function claimFunds(uint256 campaignId) external;
        function getCampaignDetails(uint256 campaignId)
            external
            view
            returns (
                address creator,
                uint256 goal,
                uint256 deadline,
                uint256 amountRaised,
                bool claimed,
                bool active
            );
        function getCampaignBackers(uint256 campaignId) external view returns (address[] memory);
    }
}
