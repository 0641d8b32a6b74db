use alloy::sol;

sol! {
    interface IVoter {
        function vote(uint256 _tokenId, address[] calldata _poolVote, uint256[] calldata _weights) external;
    }
}
